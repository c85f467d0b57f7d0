//! Inner-call logging.
//!
//! Every round trip from a cache handler to its inner handler is reported
//! exactly once; cache hits are never reported.

use std::sync::Mutex;

use serde_json::Value;
use tracing::debug;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::logger";

pub trait CallLogger: Send + Sync {
    fn log_call(&self, operation: &'static str, arguments: &Value);
}

/// Emits one `debug` event per inner call.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCallLogger;

impl CallLogger for TracingCallLogger {
    fn log_call(&self, operation: &'static str, arguments: &Value) {
        debug!(
            target: "persistence_cache::calls",
            operation,
            arguments = %arguments,
            "persistence call"
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedCall {
    pub operation: &'static str,
    pub arguments: Value,
}

/// Keeps every logged call in order.
#[derive(Debug, Default)]
pub struct MemoryCallLogger {
    calls: Mutex<Vec<LoggedCall>>,
}

impl MemoryCallLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LoggedCall> {
        mutex_lock(&self.calls, SOURCE, "calls").clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        mutex_lock(&self.calls, SOURCE, "operations")
            .iter()
            .map(|call| call.operation)
            .collect()
    }

    pub fn count(&self) -> usize {
        mutex_lock(&self.calls, SOURCE, "count").len()
    }

    pub fn count_of(&self, operation: &str) -> usize {
        mutex_lock(&self.calls, SOURCE, "count_of")
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub fn has_call(&self, operation: &str) -> bool {
        self.count_of(operation) > 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.calls, SOURCE, "clear").clear();
    }
}

impl CallLogger for MemoryCallLogger {
    fn log_call(&self, operation: &'static str, arguments: &Value) {
        mutex_lock(&self.calls, SOURCE, "log_call").push(LoggedCall {
            operation,
            arguments: arguments.clone(),
        });
    }
}
