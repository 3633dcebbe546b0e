//! Expression node types.
//!
//! [`Expression`] is the closed, tagged wire form of every node. The typed
//! views ([`PropertyExpression`], [`OperatorExpression`], ...) are what the
//! rest of the crate works with; they serialize through [`Expression`] so the
//! persisted JSON always carries its `type` tag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::{Property, PropertyType};

// =============================================================================
// Wire form
// =============================================================================

/// Any expression node.
///
/// Every variant must be handled when converting into the typed views - the
/// compiler enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expression {
    Property {
        property: Property,
    },
    Operator {
        property: Property,
        operator: Operator,
    },
    Reduce {
        property: Property,
        reduce: Property,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        parameters: Vec<FunctionParameterExpression>,
    },
    GroupBy {
        property: Property,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval: Option<Property>,
    },
    FunctionParameter {
        name: String,
        #[serde(default)]
        value: ScalarValue,
        #[serde(rename = "fieldType", default)]
        field_type: PropertyType,
    },
    And {
        #[serde(default)]
        expressions: Vec<Expression>,
    },
    Or {
        #[serde(default)]
        expressions: Vec<Expression>,
    },
}

impl Expression {
    /// The wire tag of this node.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Property { .. } => "property",
            Expression::Operator { .. } => "operator",
            Expression::Reduce { .. } => "reduce",
            Expression::GroupBy { .. } => "groupBy",
            Expression::FunctionParameter { .. } => "functionParameter",
            Expression::And { .. } => "and",
            Expression::Or { .. } => "or",
        }
    }
}

/// Error converting a wire node into a typed view.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected} expression, found {found}")]
pub struct ExpressionError {
    pub expected: &'static str,
    pub found: &'static str,
}

// =============================================================================
// Values
// =============================================================================

/// A single literal operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Default for ScalarValue {
    fn default() -> Self {
        ScalarValue::String(String::new())
    }
}

impl ScalarValue {
    /// Textual form, as the user typed it.
    pub fn as_text(&self) -> String {
        match self {
            ScalarValue::Bool(b) => b.to_string(),
            ScalarValue::Number(n) => n.to_string(),
            ScalarValue::String(s) => s.clone(),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.into())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Number(n.into())
    }
}

impl From<i32> for ScalarValue {
    fn from(n: i32) -> Self {
        ScalarValue::Number(n.into())
    }
}

impl From<f64> for ScalarValue {
    fn from(f: f64) -> Self {
        serde_json::Number::from_f64(f)
            .map(ScalarValue::Number)
            .unwrap_or_else(|| ScalarValue::String(f.to_string()))
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

/// Operand of a filter: one value or a list (multi-value operators).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorValue {
    List(Vec<ScalarValue>),
    Scalar(ScalarValue),
}

impl OperatorValue {
    /// View the operand as a list; a scalar becomes a one-element list.
    pub fn as_list(&self) -> Vec<&ScalarValue> {
        match self {
            OperatorValue::List(values) => values.iter().collect(),
            OperatorValue::Scalar(v) => vec![v],
        }
    }
}

impl From<ScalarValue> for OperatorValue {
    fn from(v: ScalarValue) -> Self {
        OperatorValue::Scalar(v)
    }
}

impl From<&str> for OperatorValue {
    fn from(s: &str) -> Self {
        OperatorValue::Scalar(s.into())
    }
}

impl From<String> for OperatorValue {
    fn from(s: String) -> Self {
        OperatorValue::Scalar(s.into())
    }
}

impl From<i64> for OperatorValue {
    fn from(n: i64) -> Self {
        OperatorValue::Scalar(n.into())
    }
}

impl From<i32> for OperatorValue {
    fn from(n: i32) -> Self {
        OperatorValue::Scalar(n.into())
    }
}

impl From<f64> for OperatorValue {
    fn from(f: f64) -> Self {
        OperatorValue::Scalar(f.into())
    }
}

impl From<bool> for OperatorValue {
    fn from(b: bool) -> Self {
        OperatorValue::Scalar(b.into())
    }
}

/// A filter operator applied to a property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<OperatorValue>,
    #[serde(rename = "labelValue", default, skip_serializing_if = "Option::is_none")]
    pub label_value: Option<OperatorValue>,
}

// =============================================================================
// Typed views
// =============================================================================

macro_rules! expression_view {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                Expression::from(self.clone()).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let node = Expression::deserialize(deserializer)?;
                $ty::try_from(node).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// A bare column / table / function reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyExpression {
    pub property: Property,
}

impl From<PropertyExpression> for Expression {
    fn from(e: PropertyExpression) -> Self {
        Expression::Property {
            property: e.property,
        }
    }
}

impl TryFrom<Expression> for PropertyExpression {
    type Error = ExpressionError;

    fn try_from(node: Expression) -> Result<Self, Self::Error> {
        match node {
            Expression::Property { property } => Ok(Self { property }),
            other => Err(ExpressionError {
                expected: "property",
                found: other.kind(),
            }),
        }
    }
}

expression_view!(PropertyExpression);

/// A filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorExpression {
    pub property: Property,
    pub operator: Operator,
}

impl From<OperatorExpression> for Expression {
    fn from(e: OperatorExpression) -> Self {
        Expression::Operator {
            property: e.property,
            operator: e.operator,
        }
    }
}

impl TryFrom<Expression> for OperatorExpression {
    type Error = ExpressionError;

    fn try_from(node: Expression) -> Result<Self, Self::Error> {
        match node {
            Expression::Operator { property, operator } => Ok(Self { property, operator }),
            other => Err(ExpressionError {
                expected: "operator",
                found: other.kind(),
            }),
        }
    }
}

expression_view!(OperatorExpression);

/// An aggregation over a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceExpression {
    pub property: Property,
    pub reduce: Property,
    pub parameters: Vec<FunctionParameterExpression>,
}

impl From<ReduceExpression> for Expression {
    fn from(e: ReduceExpression) -> Self {
        Expression::Reduce {
            property: e.property,
            reduce: e.reduce,
            parameters: e.parameters,
        }
    }
}

impl TryFrom<Expression> for ReduceExpression {
    type Error = ExpressionError;

    fn try_from(node: Expression) -> Result<Self, Self::Error> {
        match node {
            Expression::Reduce {
                property,
                reduce,
                parameters,
            } => Ok(Self {
                property,
                reduce,
                parameters,
            }),
            other => Err(ExpressionError {
                expected: "reduce",
                found: other.kind(),
            }),
        }
    }
}

expression_view!(ReduceExpression);

/// A grouping key, binned when DateTime-typed.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByExpression {
    pub property: Property,
    pub interval: Option<Property>,
}

impl From<GroupByExpression> for Expression {
    fn from(e: GroupByExpression) -> Self {
        Expression::GroupBy {
            property: e.property,
            interval: e.interval,
        }
    }
}

impl TryFrom<Expression> for GroupByExpression {
    type Error = ExpressionError;

    fn try_from(node: Expression) -> Result<Self, Self::Error> {
        match node {
            Expression::GroupBy { property, interval } => Ok(Self { property, interval }),
            other => Err(ExpressionError {
                expected: "groupBy",
                found: other.kind(),
            }),
        }
    }
}

expression_view!(GroupByExpression);

/// A positional parameter of a reduce function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionParameterExpression {
    pub name: String,
    pub value: ScalarValue,
    pub field_type: PropertyType,
}

impl From<FunctionParameterExpression> for Expression {
    fn from(e: FunctionParameterExpression) -> Self {
        Expression::FunctionParameter {
            name: e.name,
            value: e.value,
            field_type: e.field_type,
        }
    }
}

impl TryFrom<Expression> for FunctionParameterExpression {
    type Error = ExpressionError;

    fn try_from(node: Expression) -> Result<Self, Self::Error> {
        match node {
            Expression::FunctionParameter {
                name,
                value,
                field_type,
            } => Ok(Self {
                name,
                value,
                field_type,
            }),
            other => Err(ExpressionError {
                expected: "functionParameter",
                found: other.kind(),
            }),
        }
    }
}

expression_view!(FunctionParameterExpression);

/// Boolean combinator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    And,
    Or,
}

/// `and` / `or` over typed children.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression<T> {
    pub kind: ArrayKind,
    pub expressions: Vec<T>,
}

impl<T> ArrayExpression<T> {
    pub fn and(expressions: Vec<T>) -> Self {
        Self {
            kind: ArrayKind::And,
            expressions,
        }
    }

    pub fn or(expressions: Vec<T>) -> Self {
        Self {
            kind: ArrayKind::Or,
            expressions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.expressions.iter()
    }
}

impl<T> Default for ArrayExpression<T> {
    fn default() -> Self {
        Self::and(Vec::new())
    }
}

impl<T: Into<Expression>> From<ArrayExpression<T>> for Expression {
    fn from(e: ArrayExpression<T>) -> Self {
        let expressions = e.expressions.into_iter().map(Into::into).collect();
        match e.kind {
            ArrayKind::And => Expression::And { expressions },
            ArrayKind::Or => Expression::Or { expressions },
        }
    }
}

/// Typed child of an `and` / `or` node.
///
/// Leaf predicates sit inside OR groups; everything else sits inside AND.
pub trait ArrayItem: TryFrom<Expression, Error = ExpressionError> {
    const PARENT: ArrayKind = ArrayKind::And;
}

impl ArrayItem for OperatorExpression {
    const PARENT: ArrayKind = ArrayKind::Or;
}
impl ArrayItem for ReduceExpression {}
impl ArrayItem for GroupByExpression {}
impl<T: ArrayItem> ArrayItem for ArrayExpression<T> {}

impl<T: ArrayItem> TryFrom<Expression> for ArrayExpression<T> {
    type Error = ExpressionError;

    fn try_from(node: Expression) -> Result<Self, Self::Error> {
        let expected = match T::PARENT {
            ArrayKind::And => "and",
            ArrayKind::Or => "or",
        };
        let (kind, children) = match node {
            Expression::And { expressions } => (ArrayKind::And, expressions),
            Expression::Or { expressions } => (ArrayKind::Or, expressions),
            other => {
                return Err(ExpressionError {
                    expected,
                    found: other.kind(),
                })
            }
        };
        if kind != T::PARENT {
            let found = match kind {
                ArrayKind::And => "and",
                ArrayKind::Or => "or",
            };
            return Err(ExpressionError { expected, found });
        }
        let expressions = children
            .into_iter()
            .map(T::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { kind, expressions })
    }
}

impl<T: Clone + Into<Expression>> Serialize for ArrayExpression<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Expression::from(self.clone()).serialize(serializer)
    }
}

impl<'de, T: ArrayItem> Deserialize<'de> for ArrayExpression<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = Expression::deserialize(deserializer)?;
        ArrayExpression::try_from(node).map_err(serde::de::Error::custom)
    }
}

/// One OR group of leaf predicates.
pub type OrGroup = ArrayExpression<OperatorExpression>;

/// The `where` clause: an AND of OR groups.
pub type WhereExpression = ArrayExpression<OrGroup>;

// =============================================================================
// Query expression
// =============================================================================

/// The structured part of a query: `from`, `where`, `reduce`, `groupBy`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExpression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PropertyExpression>,
    #[serde(default)]
    pub r#where: WhereExpression,
    #[serde(default)]
    pub reduce: ArrayExpression<ReduceExpression>,
    #[serde(default)]
    pub group_by: ArrayExpression<GroupByExpression>,
}

impl QueryExpression {
    /// An expression with only a source table.
    pub fn from_table(name: &str) -> Self {
        Self {
            from: Some(PropertyExpression {
                property: Property::new(name, PropertyType::String),
            }),
            ..Self::default()
        }
    }

    pub fn with_from(mut self, from: PropertyExpression) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_where(mut self, r#where: WhereExpression) -> Self {
        self.r#where = r#where;
        self
    }

    pub fn with_reduce(mut self, reduce: ArrayExpression<ReduceExpression>) -> Self {
        self.reduce = reduce;
        self
    }

    pub fn with_group_by(mut self, group_by: ArrayExpression<GroupByExpression>) -> Self {
        self.group_by = group_by;
        self
    }

    /// Name of the source, if one is set and non-empty.
    pub fn source_name(&self) -> Option<&str> {
        self.from
            .as_ref()
            .map(|f| f.property.name.as_str())
            .filter(|n| !n.is_empty())
    }
}
