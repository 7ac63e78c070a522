//! Configuration module for fee-report.
//!
//! Handles the config file, environment variable expansion and defaults.

mod settings;

pub use settings::{
    expand_env_vars, LedgerSettings, LoggingSettings, ReportSettings, Settings, SettingsError,
};
