// Logging hooks.  With the `uses_iceoryx2_log` feature enabled these forward to the iceoryx2
// logger, otherwise the arguments are type checked and then discarded.

#[cfg(feature = "uses_iceoryx2_log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { iceoryx2_bb_log::trace!($($arg)*) };
}

#[cfg(feature = "uses_iceoryx2_log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { iceoryx2_bb_log::debug!($($arg)*) };
}

#[cfg(feature = "uses_iceoryx2_log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { iceoryx2_bb_log::warn!($($arg)*) };
}

#[cfg(not(feature = "uses_iceoryx2_log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {{ if false { let _ = format!($($arg)*); } }};
}

#[cfg(not(feature = "uses_iceoryx2_log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ if false { let _ = format!($($arg)*); } }};
}

#[cfg(not(feature = "uses_iceoryx2_log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ if false { let _ = format!($($arg)*); } }};
}

/// Set the log level from the environment, (IOX2_LOG_LEVEL,) falling back on warnings only.
/// Safe to call more than once.
pub fn init_logging() {
    #[cfg(feature = "uses_iceoryx2_log")]
    {
        use iceoryx2_bb_log::{LogLevel, set_log_level_from_env_or};
        set_log_level_from_env_or(LogLevel::Warn);
    }
}
