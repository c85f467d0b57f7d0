//! Cache key and tag generation.
//!
//! Every cache handler derives its keys and tags here and nowhere else. A
//! semantic type (`content`, `content_version`, ...) maps to a short pattern
//! with `%s` placeholders that are filled positionally. Tags and keys use two
//! separate tables; keys additionally carry the configured prefix.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::content::{RelationType, VersionStatus};
use crate::domain::content_type::ContentTypeStatus;

pub const DEFAULT_KEY_PREFIX: &str = "ibx-";

/// Fragment used for a list argument that was not supplied at all.
pub const ALL_TRANSLATIONS: &str = "0";

/// How a list element equal to [`ALL_TRANSLATIONS`] is rendered. Escaping
/// never produces `_0`, so no list can render as the sentinel.
const ESCAPED_SENTINEL: &str = "_0";

const PLACEHOLDER: &str = "%s";
const LIST_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unknown cache pattern `{name}`")]
    UnknownPattern { name: String },
    #[error("pattern `{name}` expects {expected} placeholder(s) but the override has {actual}")]
    PlaceholderMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("pattern `{name}` must not be empty")]
    EmptyPattern { name: String },
    #[error("pattern `{name}` expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
    },
}

impl PatternError {
    fn unknown(name: &str) -> Self {
        Self::UnknownPattern {
            name: name.to_string(),
        }
    }
}

macro_rules! pattern_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = ($label:literal, $pattern:literal),)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Configuration name of the semantic type.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn default_pattern(self) -> &'static str {
                match self {
                    $($name::$variant => $pattern,)+
                }
            }

            pub fn placeholders(self) -> usize {
                self.default_pattern().matches(PLACEHOLDER).count()
            }
        }

        impl FromStr for $name {
            type Err = PatternError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($label => Ok($name::$variant),)+
                    _ => Err(PatternError::unknown(value)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pattern_table! {
    /// Invalidation classes. Tags are never prefixed.
    pub enum TagKind {
        Content = ("content", "c-%s"),
        ContentVersion = ("content_version", "c-%s-v-%s"),
        ContentVersionList = ("content_version_list", "c-%s-vl"),
        ContentFieldsType = ("content_fields_type", "cft-%s"),
        Relation = ("relation", "re-%s"),
        Location = ("location", "l-%s"),
        LocationPath = ("location_path", "lp-%s"),
        Type = ("type", "t-%s"),
        TypeWithStatus = ("type_with_status", "t-%s-s-%s"),
        TypeGroup = ("type_group", "tg-%s"),
        TypeGroupList = ("type_group_list", "ctgl"),
        TypeMap = ("type_map", "tm"),
        User = ("user", "u-%s"),
        UserByEmail = ("user_with_by_email_suffix", "u-%s-be"),
        UserAccountKey = ("user_with_account_key_suffix", "u-%s-ak"),
        UserByAccountKey = ("user_with_by_account_key_suffix", "u-%s-bak"),
        Role = ("role", "r-%s"),
        Policy = ("policy", "p-%s"),
        RoleAssignment = ("role_assignment", "ra-%s"),
        RoleAssignmentGroupList = ("role_assignment_group_list", "ragl-%s"),
        RoleAssignmentRoleList = ("role_assignment_role_list", "rarl-%s"),
        RoleAssignmentInherited = ("role_assignment_inherited", "rai"),
        Section = ("section", "se-%s"),
        State = ("state", "s-%s"),
        StateGroup = ("state_group", "sg-%s"),
        StateGroupAll = ("state_group_all", "sga"),
        ContentState = ("content_state", "cs-%s-%s"),
        UrlAlias = ("url_alias", "urla-%s"),
        UrlAliasCustom = ("url_alias_custom", "urlac-%s"),
        UrlAliasLocation = ("url_alias_location", "urlal-%s"),
        UrlAliasUrl = ("url_alias_url", "urlau-%s"),
        UrlWildcard = ("url_wildcard", "urlw-%s"),
        UrlWildcardTranslation = ("url_wildcard_translation", "urlwt"),
        Language = ("language", "la-%s"),
        LanguageList = ("language_list", "lal"),
    }
}

pattern_table! {
    /// Single-result reads. Keys are prefixed with the configured key prefix.
    pub enum KeyKind {
        Content = ("content", "c-%s-%s-%s"),
        ContentInfo = ("content_info", "ci-%s"),
        ContentInfoByRemoteId = ("content_info_by_remote_id", "cibri-%s"),
        ContentVersionInfo = ("content_version_info", "cvi-%s-%s"),
        ContentVersionList = ("content_version_list", "c-%s-vl"),
        ContentRelation = ("content_relation", "re-%s"),
        ContentRelationsCount = ("content_relations_count_with_by_version_type_suffix", "crc-%s-v-%s-t-%s"),
        ContentRelationsList = ("content_relations_list_with_by_version_type_suffix", "crl-%s-l-%s-o-%s-v-%s-t-%s"),
        ContentReverseRelationsCount = ("content_reverse_relations_count", "crrc-%s-t-%s"),
        ContentType = ("content_type", "ct-%s-%s"),
        ContentTypeByIdentifier = ("content_type_by_identifier", "ct-%s-bi"),
        ContentTypeByRemoteId = ("content_type_by_remote_id", "ct-%s-br"),
        ContentTypeGroup = ("content_type_group", "ctg-%s"),
        ContentTypeGroupByIdentifier = ("content_type_group_by_identifier", "ctg-%s-bi"),
        ContentTypeGroupList = ("content_type_group_list", "ctgl"),
        ContentTypeListByGroup = ("content_type_list_by_group", "ctlbg-%s"),
        ContentTypeFieldMap = ("content_type_field_map", "ctfm"),
        Location = ("location", "l-%s-%s-%s"),
        LocationByRemoteId = ("location_by_remote_id", "lri-%s-%s-%s"),
        LocationSubtree = ("location_subtree", "ls-%s"),
        ContentLocations = ("content_locations", "cl-%s-root-%s"),
        ContentLocationsForDraft = ("content_locations_for_draft", "cl-%s-pfd"),
        User = ("user", "u-%s"),
        UserByLogin = ("user_with_by_login_suffix", "u-%s-bl"),
        UserByEmail = ("user_with_by_email_suffix", "u-%s-be"),
        UserByAccountKey = ("user_with_by_account_key_suffix", "u-%s-bak"),
        Role = ("role", "r-%s"),
        RoleByIdentifier = ("role_by_identifier", "r-%s-bi"),
        RoleAssignment = ("role_assignment", "ra-%s"),
        RoleAssignmentsByGroup = ("role_assignments_by_group", "ra-%s-bg-%s"),
        RoleAssignmentsByRole = ("role_assignments_by_role", "ra-%s-bro"),
        Section = ("section", "se-%s"),
        SectionByIdentifier = ("section_by_identifier", "se-%s-bi"),
        State = ("state", "s-%s"),
        StateByIdentifier = ("state_by_identifier", "si-%s-%s"),
        StateGroup = ("state_group", "sg-%s"),
        StateGroupByIdentifier = ("state_group_by_identifier", "sg-%s-bi"),
        StateGroupAll = ("state_group_all", "sga"),
        StateListByGroup = ("state_list_by_group", "slbg-%s"),
        ContentState = ("content_state", "cs-%s-%s"),
        UrlAlias = ("url_alias", "urla-%s"),
        UrlAliasLocationList = ("url_alias_location_list", "urlall-%s-%s"),
        UrlAliasUrl = ("url_alias_url", "urlau-%s"),
        UrlWildcard = ("url_wildcard", "urlw-%s"),
        UrlWildcardSource = ("url_wildcard_source", "urlws-%s"),
        Language = ("language", "la-%s"),
        LanguageCode = ("language_code", "lac-%s"),
        LanguageList = ("language_list", "lal"),
    }
}

/// One positional argument of a key or tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg<'a> {
    /// Rendered as an empty fragment; the surrounding separators stay.
    Absent,
    Int(i64),
    /// Free text; escaped so it cannot forge separators or reserved characters.
    Text(Cow<'a, str>),
    /// A fragment that is already safe, rendered verbatim.
    Raw(Cow<'a, str>),
}

impl<'a> Arg<'a> {
    pub fn text(value: impl Into<Cow<'a, str>>) -> Self {
        Self::Text(value.into())
    }

    pub fn flag(value: bool) -> Self {
        Self::Raw(Cow::Borrowed(if value { "1" } else { "0" }))
    }

    /// Joins list elements with `|`; `None` renders the "all" sentinel so it
    /// never collides with an empty list.
    pub fn list(values: Option<&[String]>) -> Self {
        match values {
            None => Self::Raw(Cow::Borrowed(ALL_TRANSLATIONS)),
            Some(values) => {
                let mut joined = String::new();
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        joined.push(LIST_SEPARATOR);
                    }
                    if value == ALL_TRANSLATIONS {
                        joined.push_str(ESCAPED_SENTINEL);
                    } else {
                        joined.push_str(&escape_fragment(value));
                    }
                }
                Self::Raw(Cow::Owned(joined))
            }
        }
    }

    /// SHA-256 of arbitrary-length input such as URLs, hex encoded.
    pub fn hashed(value: &str) -> Self {
        Self::Raw(Cow::Owned(hash_fragment(value)))
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::Absent => {}
            Self::Int(value) => out.push_str(&value.to_string()),
            Self::Text(value) => out.push_str(&escape_fragment(value)),
            Self::Raw(value) => out.push_str(value),
        }
    }
}

impl From<i64> for Arg<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Arg<'_> {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Arg<'_> {
    fn from(value: usize) -> Self {
        Self::Raw(Cow::Owned(value.to_string()))
    }
}

impl From<bool> for Arg<'_> {
    fn from(value: bool) -> Self {
        Self::flag(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<RelationType> for Arg<'_> {
    fn from(value: RelationType) -> Self {
        Self::Int(i64::from(value.bits()))
    }
}

impl From<VersionStatus> for Arg<'_> {
    fn from(value: VersionStatus) -> Self {
        Self::Int(i64::from(value.code()))
    }
}

impl From<ContentTypeStatus> for Arg<'_> {
    fn from(value: ContentTypeStatus) -> Self {
        Self::Int(i64::from(value.code()))
    }
}

impl<'a, T: Into<Arg<'a>>> From<Option<T>> for Arg<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Escape characters that are reserved by cache backends or used as
/// separators. Every reserved character maps to `_` plus one distinct letter
/// and `_` itself doubles, so the mapping stays injective.
pub fn escape_fragment(value: &str) -> Cow<'_, str> {
    if !value.chars().any(is_reserved) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '_' => escaped.push_str("__"),
            '/' => escaped.push_str("_S"),
            ':' => escaped.push_str("_C"),
            '(' => escaped.push_str("_L"),
            ')' => escaped.push_str("_R"),
            '@' => escaped.push_str("_A"),
            '\\' => escaped.push_str("_B"),
            '{' => escaped.push_str("_O"),
            '}' => escaped.push_str("_E"),
            '|' => escaped.push_str("_P"),
            ' ' => escaped.push_str("_W"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

fn is_reserved(ch: char) -> bool {
    matches!(
        ch,
        '_' | '/' | ':' | '(' | ')' | '@' | '\\' | '{' | '}' | '|' | ' '
    )
}

pub fn hash_fragment(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

fn render(pattern: &str, args: &[Arg<'_>]) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut args = args.iter();
    let mut pieces = pattern.split(PLACEHOLDER);

    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for piece in pieces {
        if let Some(arg) = args.next() {
            arg.write_to(&mut out);
        }
        out.push_str(piece);
    }
    out
}

/// Renders cache keys and tags from the pattern tables.
///
/// Stateless after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CacheIdentifierGenerator {
    prefix: String,
    tag_overrides: HashMap<TagKind, String>,
    key_overrides: HashMap<KeyKind, String>,
}

impl Default for CacheIdentifierGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl CacheIdentifierGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tag_overrides: HashMap::new(),
            key_overrides: HashMap::new(),
        }
    }

    /// Build a generator whose patterns are partly replaced by configuration.
    ///
    /// Each override must name a known pattern and keep its placeholder count.
    pub fn with_overrides(
        prefix: impl Into<String>,
        tag_patterns: &BTreeMap<String, String>,
        key_patterns: &BTreeMap<String, String>,
    ) -> Result<Self, PatternError> {
        let mut generator = Self::new(prefix);

        for (name, pattern) in tag_patterns {
            let kind = TagKind::from_str(name)?;
            validate_override(name, kind.placeholders(), pattern)?;
            generator.tag_overrides.insert(kind, pattern.clone());
        }
        for (name, pattern) in key_patterns {
            let kind = KeyKind::from_str(name)?;
            validate_override(name, kind.placeholders(), pattern)?;
            generator.key_overrides.insert(kind, pattern.clone());
        }

        Ok(generator)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn tag_pattern(&self, kind: TagKind) -> &str {
        self.tag_overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_pattern())
    }

    pub fn key_pattern(&self, kind: KeyKind) -> &str {
        self.key_overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_pattern())
    }

    pub fn generate_tag(&self, kind: TagKind, args: &[Arg<'_>]) -> String {
        debug_assert_eq!(args.len(), kind.placeholders(), "argument count for tag `{kind}`");
        render(self.tag_pattern(kind), args)
    }

    pub fn generate_key(&self, kind: KeyKind, args: &[Arg<'_>]) -> String {
        debug_assert_eq!(args.len(), kind.placeholders(), "argument count for key `{kind}`");
        let mut key = self.prefix.clone();
        key.push_str(&render(self.key_pattern(kind), args));
        key
    }

    /// String-typed entry point; the only place an unknown semantic type or a
    /// wrong argument count can surface as an error.
    pub fn generate(
        &self,
        semantic_type: &str,
        args: &[Arg<'_>],
        as_tag: bool,
    ) -> Result<String, PatternError> {
        if as_tag {
            let kind = TagKind::from_str(semantic_type)?;
            check_arity(semantic_type, kind.placeholders(), args.len())?;
            Ok(self.generate_tag(kind, args))
        } else {
            let kind = KeyKind::from_str(semantic_type)?;
            check_arity(semantic_type, kind.placeholders(), args.len())?;
            Ok(self.generate_key(kind, args))
        }
    }
}

fn check_arity(name: &str, expected: usize, actual: usize) -> Result<(), PatternError> {
    if expected != actual {
        return Err(PatternError::ArgumentCount {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn validate_override(name: &str, expected: usize, pattern: &str) -> Result<(), PatternError> {
    if pattern.trim().is_empty() {
        return Err(PatternError::EmptyPattern {
            name: name.to_string(),
        });
    }
    let actual = pattern.matches(PLACEHOLDER).count();
    if actual != expected {
        return Err(PatternError::PlaceholderMismatch {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
