#![warn(clippy::all, rust_2018_idioms)]

/// Logging macros that prefix every message with `[file:module:line]`.
///
/// `log_*` go through the `log` facade, which `tracing-log` forwards into the
/// tracing subscriber installed by `main`. `trace_*` go to tracing directly.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

/// Tracing-only variants with the same context prefix
#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => {
        tracing::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_info {
    ($($arg:tt)*) => {
        tracing::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

/*
Level guidelines:

DEBUG: per-region CLI calls, cache hit/miss, store writes
INFO:  completed aggregations, profile changes, startup and shutdown
WARN:  skipped regions, failed summary entries, blocked raw commands,
       fallbacks (RECORD_TYPE breakdown, invalid env values)
ERROR: fatal aggregation failures, server errors

Secrets are never logged. Credential validation failures log only the error
class, since the CLI message can echo the access key id.

Example output:
  [src/app/resource_explorer/aggregator.rs:awsdash_web::app::resource_explorer::aggregator:194] Skipping region me-south-1 for ec2: aws cli error: ... AuthFailure ...
*/
