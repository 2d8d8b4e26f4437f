//! Logger setup.
//!
//! Diagnostics go through the `log` facade; a `simplelog` terminal logger is
//! installed once by the binary. Stage summaries are not log records: they
//! are printed by [`crate::output`].

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Map the number of `-v` flags to a level: warn, info, then debug.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the terminal logger. Safe to call more than once.
pub fn init(verbosity: u8) {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("spacetraveling")
        .build();
    // Ignore the error if a logger was already set.
    let _ = TermLogger::init(
        level_for(verbosity),
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Initializes a debug-level logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    init(2);
}
