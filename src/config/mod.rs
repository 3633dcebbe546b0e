//! Configuration module for kql-builder.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, ClusterSettings, CompilerSettings, SchemaMappingSettings, Settings,
    SettingsError,
};
