//! TOML-based configuration for kql-builder.
//!
//! Supports a config file (kql-builder.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [cluster]
//! uri = "${ADX_CLUSTER_URI}"
//! default_database = "Samples"
//!
//! [compiler]
//! time_filter = true
//! default_interval = "5m"
//! limit = 1000
//!
//! [schema_mapping]
//! enabled = true
//!
//! [[schema_mapping.mappings]]
//! database = "Samples"
//! name = "StormEvents"
//! display_name = "Storms"
//! value = "storms"
//! type = "table"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::kql::quote;
use crate::kql::CompileOptions;
use crate::query::QueryDefaults;
use crate::schema::{RawSchemaMapping, SchemaMapper};

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub cluster: ClusterSettings,
    pub compiler: CompilerSettings,
    pub schema_mapping: SchemaMappingSettings,
}

/// Which cluster and database queries target by default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Cluster URI (supports ${ENV_VAR} expansion).
    pub uri: Option<String>,

    pub default_database: Option<String>,
}

/// Compiler behavior.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Prepend the dashboard time-range macro.
    pub time_filter: bool,

    /// Bin width for time grouping when none is chosen (e.g. "5m").
    pub default_interval: Option<String>,

    /// Row limit appended to every query.
    pub limit: Option<u64>,
}

/// Friendly names for tables, views and functions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaMappingSettings {
    pub enabled: bool,
    pub mappings: Vec<RawSchemaMapping>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `KQL_BUILDER_CONFIG`
    /// 2. `./kql-builder.toml`
    /// 3. `~/.config/kql-builder/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("KQL_BUILDER_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("kql-builder.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("kql-builder").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if let Some(interval) = &self.compiler.default_interval {
            if !quote::is_timespan_literal(interval) && !quote::is_template_variable(interval) {
                return Err(SettingsError::InvalidConfig(format!(
                    "compiler.default_interval is not a timespan: {interval}"
                )));
            }
        }
        if self.compiler.limit == Some(0) {
            return Err(SettingsError::InvalidConfig("compiler.limit must be positive".into()));
        }
        Ok(())
    }

    /// Cluster URI with environment variables expanded.
    pub fn resolved_cluster_uri(&self) -> Result<Option<String>, SettingsError> {
        self.cluster.uri.as_deref().map(expand_env_vars).transpose()
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            time_filter: self.compiler.time_filter,
            default_interval: self.compiler.default_interval.clone(),
            limit: self.compiler.limit,
        }
    }

    /// Build the mapping index. Incomplete entries are dropped.
    pub fn schema_mapper(&self) -> SchemaMapper {
        SchemaMapper::new(self.schema_mapping.enabled, &self.schema_mapping.mappings)
    }

    /// Defaults used when upgrading stored queries.
    pub fn query_defaults(&self) -> Result<QueryDefaults, SettingsError> {
        Ok(QueryDefaults {
            database: self.cluster.default_database.clone().unwrap_or_default(),
            cluster_uri: self.resolved_cluster_uri()?.unwrap_or_default(),
            ..QueryDefaults::default()
        })
    }
}

/// Expand `${VAR}` references from the environment.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut missing = None;
    let expanded = ENV_VAR.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        env::var(name).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| name.to_string());
            String::new()
        })
    });

    match missing {
        Some(name) => Err(SettingsError::MissingEnvVar(name)),
        None => Ok(expanded.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MappingKind;

    #[test]
    fn test_expand_env_vars() {
        env::set_var("KQL_BUILDER_TEST_CLUSTER", "help");
        assert_eq!(
            expand_env_vars("https://${KQL_BUILDER_TEST_CLUSTER}.kusto.windows.net").unwrap(),
            "https://help.kusto.windows.net"
        );
        assert_eq!(expand_env_vars("$plain and $__interval").unwrap(), "$plain and $__interval");
        env::remove_var("KQL_BUILDER_TEST_CLUSTER");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("${NONEXISTENT_VAR_12345}");
        assert!(matches!(result, Err(SettingsError::MissingEnvVar(name)) if name == "NONEXISTENT_VAR_12345"));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[cluster]
uri = "https://help.kusto.windows.net"
default_database = "Samples"

[compiler]
time_filter = true
default_interval = "5m"
limit = 500

[schema_mapping]
enabled = true

[[schema_mapping.mappings]]
database = "Samples"
name = "StormEvents"
display_name = "Storms"
value = "storms"
type = "table"

[[schema_mapping.mappings]]
database = "Samples"
name = "Incomplete"
"#;

        let settings = Settings::parse(toml).unwrap();
        assert_eq!(settings.cluster.default_database.as_deref(), Some("Samples"));

        let options = settings.compile_options();
        assert!(options.time_filter);
        assert_eq!(options.default_interval.as_deref(), Some("5m"));
        assert_eq!(options.limit, Some(500));

        let mapper = settings.schema_mapper();
        assert!(mapper.is_enabled());
        assert_eq!(mapper.mappings().len(), 1);
        assert_eq!(mapper.get_mapping_by_value("storms").unwrap().kind, MappingKind::Table);

        let defaults = settings.query_defaults().unwrap();
        assert_eq!(defaults.database, "Samples");
        assert_eq!(defaults.cluster_uri, "https://help.kusto.windows.net");
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let result = Settings::parse("[compiler]\ndefault_interval = \"five minutes\"\n");
        assert!(matches!(result, Err(SettingsError::InvalidConfig(_))));
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.compiler.time_filter);
        assert!(!settings.schema_mapper().is_enabled());
        assert_eq!(settings.compile_options(), CompileOptions::default());
    }
}
