//! Logging macros for the ranking engine with verbosity level control.
//!
//! Messages go to stderr and cost nothing beyond a comparison when the
//! level is off. Levels:
//! - 0: SILENT
//! - 1: CHANGES (run outcome: ranked, rejected, skipped records)
//! - 2: CHECKS (per-task decisions: skipped completed tasks, cut-off cycle edges)
//! - 3: DEBUG (every score with its explanation)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!("[taskrank] {}", format_args!($($arg)*));
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!("[taskrank] {}", format_args!($($arg)*));
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!("[taskrank] {}", format_args!($($arg)*));
        }
    };
}
