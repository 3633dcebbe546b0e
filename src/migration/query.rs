//! Upgrading whole stored queries.

use std::borrow::Cow;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::expression::{load_expression, migrate, needs_migration};
use crate::query::{QueryDefaults, QuerySource, StoredQuery, PLUGIN_VERSION};

/// Whether [`migrate_query`] would change the value.
///
/// Anything other than a JSON object is never migrated.
pub fn needs_query_migration(value: &Value, defaults: &QueryDefaults) -> bool {
    let Some(fields) = value.as_object() else {
        return false;
    };

    missing_defaults(fields, defaults).next().is_some()
        || fields.get("expression").map_or(true, needs_migration)
        || stored_raw_mode(fields).is_none()
        || stored_query_source(fields).is_none()
        || fields.get("pluginVersion").and_then(Value::as_str) != Some(PLUGIN_VERSION)
}

/// Bring a stored query up to date.
///
/// Missing fields are filled from `defaults`, `rawMode` is inferred from
/// whether the expression has a source, `querySource` follows `rawMode`, the
/// expression is migrated and `pluginVersion` is stamped. A query that is
/// already current is returned borrowed.
pub fn migrate_query<'a>(value: &'a Value, defaults: &QueryDefaults) -> Cow<'a, Value> {
    if !needs_query_migration(value, defaults) {
        return Cow::Borrowed(value);
    }
    let Some(fields) = value.as_object() else {
        return Cow::Borrowed(value);
    };

    let mut out = fields.clone();

    for (key, default) in missing_defaults(fields, defaults).collect::<Vec<_>>() {
        debug!(field = key, "filling missing query field");
        out.insert(key.into(), default);
    }

    let expression = match fields.get("expression") {
        Some(expression) => migrate(expression).into_owned(),
        None => empty_expression(),
    };
    let has_source = expression.get("from").is_some_and(|from| !from.is_null());
    out.insert("expression".into(), expression);

    let raw_mode = match stored_raw_mode(fields) {
        Some(raw_mode) => raw_mode,
        None => {
            let inferred = !has_source;
            out.insert("rawMode".into(), Value::Bool(inferred));
            inferred
        }
    };

    if stored_query_source(fields).is_none() {
        out.insert(
            "querySource".into(),
            Value::String(QuerySource::from_raw_mode(raw_mode).as_str().into()),
        );
    }

    out.insert("pluginVersion".into(), Value::String(PLUGIN_VERSION.into()));

    Cow::Owned(Value::Object(out))
}

fn stored_raw_mode(fields: &Map<String, Value>) -> Option<bool> {
    fields.get("rawMode").and_then(Value::as_bool)
}

fn stored_query_source(fields: &Map<String, Value>) -> Option<QuerySource> {
    fields
        .get("querySource")
        .and_then(Value::as_str)
        .and_then(QuerySource::from_name)
}

/// Migrate and decode a stored query.
///
/// The expression is decoded on its own so a bad clause only loses that
/// clause; a query whose other fields do not decode falls back to `defaults`.
pub fn load_query(value: &Value, defaults: &QueryDefaults) -> StoredQuery {
    let migrated = migrate_query(value, defaults);
    let mut fields = migrated.as_object().cloned().unwrap_or_default();
    let expression = fields.remove("expression");

    let mut query = StoredQuery::deserialize(&Value::Object(fields)).unwrap_or_else(|err| {
        warn!(error = %err, "stored query did not decode, using defaults");
        StoredQuery {
            database: defaults.database.clone(),
            cluster_uri: defaults.cluster_uri.clone(),
            result_format: defaults.result_format,
            query: defaults.query.clone(),
            plugin_version: PLUGIN_VERSION.into(),
            ..StoredQuery::default()
        }
    });
    query.expression = expression
        .map(|e| load_expression(&e))
        .unwrap_or_default();
    query
}

fn missing_defaults<'f>(
    fields: &'f Map<String, Value>,
    defaults: &QueryDefaults,
) -> impl Iterator<Item = (&'static str, Value)> + 'f {
    let candidates = [
        ("database", json!(defaults.database)),
        ("clusterUri", json!(defaults.cluster_uri)),
        ("query", json!(defaults.query)),
        ("resultFormat", json!(defaults.result_format.as_str())),
    ];
    candidates
        .into_iter()
        .filter(move |(key, _)| fields.get(*key).map_or(true, Value::is_null))
}

fn empty_expression() -> Value {
    json!({
        "where": { "type": "and", "expressions": [] },
        "reduce": { "type": "and", "expressions": [] },
        "groupBy": { "type": "and", "expressions": [] },
    })
}
