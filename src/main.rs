use std::process;

use persistence_cache::{
    application::error::AppError,
    cache::{Arg, CacheConfig, CacheIdentifierGenerator, KeyKind, TagKind},
    config::{self, Command, IdentifierArgs, Settings},
    infra::telemetry,
};
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

const ABSENT_ARGUMENT: &str = "-";
const LIST_SEPARATOR: char = '|';

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let cache = CacheConfig::from(&settings.cache);
    let identifiers = cache.identifier_generator()?;
    debug!(key_prefix = identifiers.prefix(), "identifier generator ready");

    match cli_args.command {
        Command::Key(args) => run_key(&identifiers, &args),
        Command::Tag(args) => run_tag(&identifiers, &args),
        Command::Patterns => {
            run_patterns(&identifiers);
            Ok(())
        }
        Command::CheckConfig => {
            run_check_config(&settings);
            Ok(())
        }
    }
}

fn run_key(identifiers: &CacheIdentifierGenerator, args: &IdentifierArgs) -> Result<(), AppError> {
    let values = parse_args(&args.args);
    println!("{}", identifiers.generate(&args.pattern, &values, false)?);
    Ok(())
}

fn run_tag(identifiers: &CacheIdentifierGenerator, args: &IdentifierArgs) -> Result<(), AppError> {
    let values = parse_args(&args.args);
    println!("{}", identifiers.generate(&args.pattern, &values, true)?);
    Ok(())
}

fn run_patterns(identifiers: &CacheIdentifierGenerator) {
    println!("tags:");
    for kind in TagKind::ALL {
        println!("  {:<48} {}", kind.name(), identifiers.tag_pattern(*kind));
    }
    println!("keys:");
    for kind in KeyKind::ALL {
        println!(
            "  {:<48} {}{}",
            kind.name(),
            identifiers.prefix(),
            identifiers.key_pattern(*kind)
        );
    }
}

fn run_check_config(settings: &Settings) {
    let cache = &settings.cache;
    println!("configuration ok");
    println!("  log level:        {}", settings.logging.level);
    println!("  cache enabled:    {}", cache.enabled);
    println!("  key prefix:       {}", cache.key_prefix);
    println!("  shared limit:     {}", cache.shared_limit);
    match cache.default_ttl {
        Some(ttl) => println!("  default ttl:      {}s", ttl.as_secs()),
        None => println!("  default ttl:      none"),
    }
    println!(
        "  in-memory layer:  {} (limit {}, ttl {}ms)",
        cache.enable_in_memory,
        cache.in_memory_limit,
        cache.in_memory_ttl.as_millis()
    );
    println!("  single flight:    {}", cache.single_flight);
    println!(
        "  overrides:        {} tag, {} key",
        cache.tag_patterns.len(),
        cache.key_patterns.len()
    );
}

/// `-` is an absent argument, integers stay numeric, `a|b` is a list.
fn parse_args(raw: &[String]) -> Vec<Arg<'_>> {
    raw.iter()
        .map(|value| {
            if value == ABSENT_ARGUMENT {
                Arg::Absent
            } else if let Ok(number) = value.parse::<i64>() {
                Arg::Int(number)
            } else if value.contains(LIST_SEPARATOR) {
                let items: Vec<String> = value.split(LIST_SEPARATOR).map(str::to_string).collect();
                Arg::list(Some(items.as_slice()))
            } else {
                Arg::text(value.as_str())
            }
        })
        .collect()
}
