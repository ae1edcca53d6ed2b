#![warn(clippy::all, rust_2018_idioms)]

/// Logging macros that prefix every message with file, module and line
/// and write to both the `log` and the `tracing` facade
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::warn!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::error!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

/// Tracing-only variants, for high-volume detail that should not reach `log`
#[macro_export]
macro_rules! trace_trace {
    ($($arg:tt)*) => {
        tracing::trace!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => {
        tracing::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

/*
Log level guidelines for the data hub:

TRACE: per-entry lookups (import, get_entry misses)
DEBUG: store mutations, subscribe/unsubscribe, snapshot file writes
INFO:  clears, snapshot save/restore totals, start-up milestones
WARN:  failing or panicking event handlers, skipped snapshot entries,
       hub requests rejected with a user notification
ERROR: persistence failures that lose user data

Never log from per-frame UI code; the panel model refreshes from events.

Example output:
  [src/app/data_hub/mod.rs:mathlab::app::data_hub:142] matrices exported matrix 'Matrix A' (3f9c...)
*/
