//! Upgrading stored expressions to the current node shapes.
//!
//! Older editors stored a different tree:
//!
//! ```text
//! from:    { expression: { type: field, value, fieldType } }
//! where:   and ── operatorRepeater ── fieldAndOperator { field, operator }
//! reduce:  and ── reduce { field, reduce: { value }, parameters }
//! groupBy: and ── groupBy { field, interval: { value } }
//! ```
//!
//! There is no version field; the shape is recognized structurally.

use std::borrow::Cow;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::catalog::PropertyType;
use crate::expression::{
    ArrayExpression, GroupByExpression, PropertyExpression, QueryExpression, ReduceExpression,
    WhereExpression,
};

const CLAUSES: [&str; 4] = ["from", "where", "reduce", "groupBy"];

/// Which generation of expression a stored value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionShape {
    /// Only legacy markers found.
    Legacy,
    /// Both legacy and current markers; left untouched.
    Ambiguous,
    /// Current shape, or nothing recognizable at all.
    Current,
}

#[derive(Debug, Default)]
struct Markers {
    legacy: bool,
    current: bool,
}

impl Markers {
    fn scan(&mut self, node: &Value) {
        match node {
            Value::Array(items) => items.iter().for_each(|item| self.scan(item)),
            Value::Object(fields) => {
                match fields.get("type").and_then(Value::as_str) {
                    Some("fieldAndOperator" | "operatorRepeater" | "field") => self.legacy = true,
                    Some("operator" | "property") => self.current = true,
                    Some("reduce" | "groupBy") => {
                        if fields.contains_key("field") {
                            self.legacy = true;
                        }
                        if fields.contains_key("property") {
                            self.current = true;
                        }
                    }
                    _ => {}
                }
                fields.values().for_each(|child| self.scan(child));
            }
            _ => {}
        }
    }
}

/// Classify a stored expression.
pub fn detect_shape(value: &Value) -> ExpressionShape {
    let Some(fields) = value.as_object() else {
        return ExpressionShape::Current;
    };

    let mut markers = Markers::default();
    if fields
        .get("from")
        .and_then(|from| from.pointer("/expression/value"))
        .is_some_and(Value::is_string)
    {
        markers.legacy = true;
    }
    for clause in CLAUSES {
        if let Some(node) = fields.get(clause) {
            markers.scan(node);
        }
    }

    match (markers.legacy, markers.current) {
        (true, false) => ExpressionShape::Legacy,
        (true, true) => ExpressionShape::Ambiguous,
        _ => ExpressionShape::Current,
    }
}

/// Whether [`migrate`] would change the value.
pub fn needs_migration(value: &Value) -> bool {
    detect_shape(value) == ExpressionShape::Legacy
}

/// Upgrade a stored expression to the current shape.
///
/// Returns the input unchanged (borrowed) when it is already current or
/// ambiguous.
pub fn migrate(value: &Value) -> Cow<'_, Value> {
    match detect_shape(value) {
        ExpressionShape::Current => Cow::Borrowed(value),
        ExpressionShape::Ambiguous => {
            warn!("expression mixes legacy and current nodes, not migrating");
            Cow::Borrowed(value)
        }
        ExpressionShape::Legacy => Cow::Owned(migrate_legacy(value)),
    }
}

/// Migrate and decode a stored expression.
///
/// A clause that still fails to decode falls back to its default.
pub fn load_expression(value: &Value) -> QueryExpression {
    let migrated = migrate(value);
    match QueryExpression::deserialize(migrated.as_ref()) {
        Ok(expression) => expression,
        Err(err) => {
            debug!(error = %err, "expression did not decode whole, loading clause by clause");
            load_clauses(migrated.as_ref())
        }
    }
}

fn load_clauses(value: &Value) -> QueryExpression {
    fn clause<T: for<'de> Deserialize<'de>>(value: &Value, name: &str) -> Option<T> {
        let node = value.get(name)?;
        T::deserialize(node)
            .map_err(|err| debug!(clause = name, error = %err, "clause dropped"))
            .ok()
    }

    QueryExpression {
        from: clause::<PropertyExpression>(value, "from"),
        r#where: clause::<WhereExpression>(value, "where").unwrap_or_default(),
        reduce: clause::<ArrayExpression<ReduceExpression>>(value, "reduce").unwrap_or_default(),
        group_by: clause::<ArrayExpression<GroupByExpression>>(value, "groupBy").unwrap_or_default(),
    }
}

// ============================================================================
// Legacy → current
// ============================================================================

fn migrate_legacy(value: &Value) -> Value {
    let mut out = Map::new();

    if let Some(from) = value.get("from").and_then(migrate_from) {
        out.insert("from".into(), from);
    }

    let mut conditions = Vec::new();
    if let Some(node) = value.get("where") {
        collect(node, "fieldAndOperator", &mut conditions);
    }
    let groups: Vec<Value> = conditions
        .into_iter()
        .filter_map(migrate_condition)
        .map(|leaf| json!({ "type": "or", "expressions": [leaf] }))
        .collect();
    out.insert("where".into(), and(groups));

    let mut reduces = Vec::new();
    if let Some(node) = value.get("reduce") {
        collect(node, "reduce", &mut reduces);
    }
    out.insert("reduce".into(), and(reduces.into_iter().filter_map(migrate_reduce).collect()));

    let mut groups = Vec::new();
    if let Some(node) = value.get("groupBy") {
        collect(node, "groupBy", &mut groups);
    }
    out.insert("groupBy".into(), and(groups.into_iter().filter_map(migrate_group_by).collect()));

    Value::Object(out)
}

fn and(expressions: Vec<Value>) -> Value {
    json!({ "type": "and", "expressions": expressions })
}

/// Collect every node of `kind`, depth first, wherever it is nested.
fn collect<'v>(node: &'v Value, kind: &str, out: &mut Vec<&'v Value>) {
    match node {
        Value::Array(items) => items.iter().for_each(|item| collect(item, kind, out)),
        Value::Object(fields) => {
            if fields.get("type").and_then(Value::as_str) == Some(kind) && fields.contains_key("field") {
                out.push(node);
                return;
            }
            if let Some(children) = fields.get("expressions") {
                collect(children, kind, out);
            }
        }
        _ => {}
    }
}

/// `{ type: field, value, fieldType }` → `{ name, type }`.
fn migrate_field(field: &Value) -> Option<Value> {
    let name = field.get("value")?.as_str().filter(|s| !s.is_empty())?;
    Some(json!({ "name": name, "type": field_type(field.get("fieldType")) }))
}

fn field_type(node: Option<&Value>) -> Value {
    let ty = node
        .and_then(|v| PropertyType::deserialize(v).ok())
        .unwrap_or_default();
    json!(ty)
}

fn migrate_from(from: &Value) -> Option<Value> {
    let field = from.get("expression").unwrap_or(from);
    match migrate_field(field) {
        Some(property) => Some(json!({ "type": "property", "property": property })),
        None => {
            debug!("legacy from clause without a table name dropped");
            None
        }
    }
}

fn migrate_condition(node: &Value) -> Option<Value> {
    let Some(property) = node.get("field").and_then(migrate_field) else {
        debug!("legacy condition without a field dropped");
        return None;
    };

    let legacy = node.get("operator").and_then(Value::as_object);
    let mut operator = Map::new();
    operator.insert(
        "name".into(),
        legacy
            .and_then(|op| op.get("name"))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
    );
    for key in ["value", "labelValue"] {
        if let Some(v) = legacy.and_then(|op| op.get(key)).filter(|v| !v.is_null()) {
            operator.insert(key.into(), v.clone());
        }
    }

    Some(json!({ "type": "operator", "property": property, "operator": operator }))
}

fn migrate_reduce(node: &Value) -> Option<Value> {
    let Some(property) = node.get("field").and_then(migrate_field) else {
        debug!("legacy reduce without a field dropped");
        return None;
    };
    let function = node
        .pointer("/reduce/value")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut out = json!({
        "type": "reduce",
        "property": property,
        "reduce": { "name": function, "type": "function" },
    });

    let parameters: Vec<Value> = node
        .get("parameters")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("functionParameter"))
        .cloned()
        .collect();
    if !parameters.is_empty() {
        out["parameters"] = Value::Array(parameters);
    }

    Some(out)
}

fn migrate_group_by(node: &Value) -> Option<Value> {
    let Some(property) = node.get("field").and_then(migrate_field) else {
        debug!("legacy group by without a field dropped");
        return None;
    };

    let mut out = json!({ "type": "groupBy", "property": property });
    if let Some(interval) = node
        .pointer("/interval/value")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        out["interval"] = json!({ "name": interval, "type": "interval" });
    }

    Some(out)
}
