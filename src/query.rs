//! The query object persisted by the host and exchanged with it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::expression::QueryExpression;

/// Version stamped into every migrated query.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Requested output shape for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    #[default]
    Table,
    TimeSeries,
    AdxTimeSeries,
}

impl ResultFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFormat::Table => "table",
            ResultFormat::TimeSeries => "time_series",
            ResultFormat::AdxTimeSeries => "adx_time_series",
        }
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(ResultFormat::Table),
            "time_series" => Ok(ResultFormat::TimeSeries),
            "adx_time_series" => Ok(ResultFormat::AdxTimeSeries),
            other => Err(format!("unknown result format: {other}")),
        }
    }
}

/// Which editor produced the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    Raw,
    Builder,
}

impl QuerySource {
    pub fn from_raw_mode(raw_mode: bool) -> Self {
        if raw_mode {
            QuerySource::Raw
        } else {
            QuerySource::Builder
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "raw" => Some(QuerySource::Raw),
            "builder" => Some(QuerySource::Builder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuerySource::Raw => "raw",
            QuerySource::Builder => "builder",
        }
    }
}

/// A stored query, current shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredQuery {
    #[serde(default)]
    pub ref_id: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub cluster_uri: String,
    /// Hand-written KQL, used in raw mode.
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub expression: QueryExpression,
    #[serde(default)]
    pub result_format: ResultFormat,
    #[serde(default)]
    pub raw_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_source: Option<QuerySource>,
    #[serde(default)]
    pub plugin_version: String,
}

impl StoredQuery {
    /// Whether the hand-written text, not the expression, is authoritative.
    pub fn is_raw(&self) -> bool {
        match self.query_source {
            Some(source) => source == QuerySource::Raw,
            None => self.raw_mode,
        }
    }
}

/// Values filled into a stored query when they are missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDefaults {
    pub database: String,
    pub cluster_uri: String,
    pub result_format: ResultFormat,
    pub query: String,
}
