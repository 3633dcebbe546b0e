//! Query expression → KQL.
//!
//! The compiler walks a [`QueryExpression`] against the resolved columns of
//! its source and builds a [`Pipeline`]:
//!
//! ```text
//! <source> | where $__timeFilter(T) | where (a or b) and (c) | summarize f(x) by k, bin(T, 5m) | take N
//! ```
//!
//! It never fails. Anything that cannot be rendered becomes a `/* ... */`
//! marker in the output plus a [`CompileWarning`], so the text is always
//! previewable and a broken query cannot run by accident.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use super::expr::{all_of, any_of, col, func, paren, Expr, Literal};
use super::pipeline::{Pipeline, Source};
use super::quote;
use crate::catalog::{self, OperatorDef, OperatorForm, Property, PropertyType};
use crate::expression::{
    GroupByExpression, OperatorExpression, QueryExpression, ReduceExpression, ScalarValue,
};
use crate::schema::{MappingKind, ResolvedTableSchema, SchemaMapping};

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    /// Prepend `where $__timeFilter(<first datetime column>)`.
    pub time_filter: bool,

    /// Bin width for DateTime group-by keys without an interval.
    pub default_interval: Option<String>,

    /// Append `take N`.
    pub limit: Option<u64>,
}

impl CompileOptions {
    pub fn with_time_filter(mut self, enabled: bool) -> Self {
        self.time_filter = enabled;
        self
    }

    pub fn with_default_interval(mut self, interval: &str) -> Self {
        self.default_interval = Some(interval.to_string());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Everything the compiler reads besides the expression itself.
#[derive(Debug, Clone)]
pub struct CompileContext<'a> {
    pub schema: &'a ResolvedTableSchema,

    /// Database the query runs against.
    pub database: &'a str,

    /// Mapping the `from` value was resolved through, if any.
    pub mapping: Option<&'a SchemaMapping>,

    pub options: CompileOptions,
}

impl<'a> CompileContext<'a> {
    pub fn new(schema: &'a ResolvedTableSchema, database: &'a str) -> Self {
        Self {
            schema,
            database,
            mapping: None,
            options: CompileOptions::default(),
        }
    }

    pub fn with_mapping(mut self, mapping: Option<&'a SchemaMapping>) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }
}

// ============================================================================
// Output
// ============================================================================

/// A problem found while compiling. The query text is still produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileWarning {
    /// Operator or function with no rendering for this property type.
    UnsupportedOperator {
        property: String,
        operator: String,
        property_type: PropertyType,
    },

    /// Operand cannot be cast to the property type.
    InvalidValue {
        property: String,
        value: String,
        property_type: PropertyType,
    },

    /// Numeric aggregation over a non-numeric column. Rendered anyway.
    TypeMismatch {
        property: String,
        function: String,
        property_type: PropertyType,
    },

    /// No source selected; a placeholder was emitted.
    MissingSource,
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileWarning::UnsupportedOperator {
                property,
                operator,
                property_type,
            } => write!(f, "unsupported: {operator} on {property_type:?} column {property}"),
            CompileWarning::InvalidValue {
                property,
                value,
                property_type,
            } => write!(f, "invalid {property_type:?} value for {property}: {value}"),
            CompileWarning::TypeMismatch {
                property,
                function,
                property_type,
            } => write!(f, "{function} expects a numeric column, {property} is {property_type:?}"),
            CompileWarning::MissingSource => f.write_str("no source table selected"),
        }
    }
}

/// Result of compiling an expression.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated KQL.
    pub query: String,

    /// The pipeline AST (for further manipulation if needed).
    pub pipeline: Pipeline,

    pub warnings: Vec<CompileWarning>,
}

// ============================================================================
// Entry points
// ============================================================================

/// Compile an expression to KQL text.
pub fn compile(expression: &QueryExpression, schema: &ResolvedTableSchema, database: &str) -> String {
    compile_with(expression, &CompileContext::new(schema, database)).query
}

/// Compile with options, returning the pipeline and any warnings.
pub fn compile_with(expression: &QueryExpression, ctx: &CompileContext<'_>) -> CompileOutput {
    let mut compiler = Compiler {
        ctx,
        warnings: Vec::new(),
    };
    let pipeline = compiler.pipeline(expression);
    let query = pipeline.to_kql();

    for warning in &compiler.warnings {
        debug!(%warning, "compile warning");
    }

    CompileOutput {
        query,
        pipeline,
        warnings: compiler.warnings,
    }
}

// ============================================================================
// Compiler
// ============================================================================

struct Compiler<'c, 'a> {
    ctx: &'c CompileContext<'a>,
    warnings: Vec<CompileWarning>,
}

impl Compiler<'_, '_> {
    fn pipeline(&mut self, expression: &QueryExpression) -> Pipeline {
        let mut pipeline = Pipeline::new(self.source(expression));

        if self.ctx.options.time_filter {
            match self.ctx.schema.first_datetime_column() {
                Some(column) => {
                    pipeline = pipeline.filter(func("$__timeFilter", vec![col(&column.name)]));
                }
                None => debug!("time filter requested but source has no datetime column"),
            }
        }

        let groups: Vec<Expr> = expression
            .r#where
            .iter()
            .filter_map(|group| {
                let leaves: Vec<Expr> = group.iter().filter_map(|leaf| self.predicate(leaf)).collect();
                (!leaves.is_empty()).then(|| paren(any_of(leaves)))
            })
            .collect();
        if !groups.is_empty() {
            pipeline = pipeline.filter(all_of(groups));
        }

        let aggregates = expression
            .reduce
            .iter()
            .filter_map(|r| self.aggregate(r))
            .collect();
        let keys = expression
            .group_by
            .iter()
            .filter_map(|g| self.group_key(g))
            .collect();
        pipeline = pipeline.summarize(aggregates, keys);

        if let Some(limit) = self.ctx.options.limit {
            pipeline = pipeline.take(limit);
        }

        pipeline
    }

    // ------------------------------------------------------------------------
    // Source
    // ------------------------------------------------------------------------

    fn source(&mut self, expression: &QueryExpression) -> Source {
        let Some(name) = expression.source_name() else {
            self.warnings.push(CompileWarning::MissingSource);
            return Source::Placeholder;
        };

        if let Some(mapping) = self.ctx.mapping {
            let database = (mapping.database != self.ctx.database).then(|| mapping.database.clone());
            return match mapping.kind {
                MappingKind::Function => function_source(database, &mapping.name),
                MappingKind::Table | MappingKind::MaterializedView => Source::Table {
                    database,
                    name: mapping.name.clone(),
                },
            };
        }

        let is_function = expression
            .from
            .as_ref()
            .is_some_and(|f| f.property.property_type == PropertyType::Function);
        if is_function {
            function_source(None, name)
        } else {
            Source::table(name)
        }
    }

    // ------------------------------------------------------------------------
    // where
    // ------------------------------------------------------------------------

    fn predicate(&mut self, leaf: &OperatorExpression) -> Option<Expr> {
        let property = &leaf.property;
        let op_name = leaf.operator.name.trim();
        if property.name.trim().is_empty() || op_name.is_empty() {
            return None;
        }

        let Some(def) = catalog::operator(op_name).filter(|d| d.supports(property.property_type)) else {
            return Some(self.unsupported(property, op_name));
        };

        Some(self.operation(def, leaf).unwrap_or_else(|marker| marker))
    }

    /// Render one leaf; `Err` carries the marker replacing it.
    fn operation(&mut self, def: &OperatorDef, leaf: &OperatorExpression) -> Result<Expr, Expr> {
        let property = &leaf.property;
        let ty = property.property_type;
        let column = self.column(property);
        let values: Vec<&ScalarValue> = leaf
            .operator
            .value
            .as_ref()
            .map(|v| v.as_list())
            .unwrap_or_default();

        let expr = match def.form {
            OperatorForm::Function => func(def.name, vec![column]),
            OperatorForm::Infix => {
                let Some(value) = values.first() else {
                    return Err(self.invalid(&property.name, ty, "<none>"));
                };
                Expr::Binary {
                    left: Box::new(column),
                    op: def.name.into(),
                    right: Box::new(self.literal(&property.name, ty, value)?),
                }
            }
            OperatorForm::List => {
                if values.is_empty() {
                    return Err(self.invalid(&property.name, ty, "<empty list>"));
                }
                let mut rendered = Vec::with_capacity(values.len());
                for value in values {
                    rendered.push(self.literal(&property.name, ty, value)?);
                }
                Expr::List {
                    expr: Box::new(column),
                    op: def.name.into(),
                    values: rendered,
                }
            }
            OperatorForm::Range => {
                let [low, high] = values.as_slice() else {
                    let text = values.iter().map(|v| v.as_text()).collect::<Vec<_>>().join(", ");
                    return Err(self.invalid(&property.name, ty, &format!("[{text}]")));
                };
                Expr::Range {
                    expr: Box::new(column),
                    op: def.name.into(),
                    low: Box::new(self.literal(&property.name, ty, low)?),
                    high: Box::new(self.literal(&property.name, ty, high)?),
                }
            }
        };

        Ok(expr)
    }

    // ------------------------------------------------------------------------
    // summarize
    // ------------------------------------------------------------------------

    fn aggregate(&mut self, reduce: &ReduceExpression) -> Option<Expr> {
        let function = reduce.reduce.name.trim();
        if function.is_empty() {
            return None;
        }

        let Some(def) = catalog::reduce_function(function) else {
            return Some(self.unsupported(&reduce.property, function));
        };

        if !def.takes_column {
            return Some(func(def.name, vec![]));
        }

        let property = &reduce.property;
        if property.name.trim().is_empty() || property.name == "*" {
            debug!(function = def.name, "aggregation without a column skipped");
            return None;
        }

        if def.numeric_only && !property.property_type.is_numeric() {
            self.warnings.push(CompileWarning::TypeMismatch {
                property: property.name.clone(),
                function: def.name.into(),
                property_type: property.property_type,
            });
        }

        let mut args = vec![self.column(property)];
        for param in &reduce.parameters {
            let arg = self
                .literal(&param.name, param.field_type, &param.value)
                .unwrap_or_else(|marker| marker);
            args.push(arg);
        }
        if let Some(missing) = def.parameters.get(reduce.parameters.len()) {
            args.push(self.invalid(missing, PropertyType::Number, "<missing>"));
        }

        Some(func(def.name, args))
    }

    fn group_key(&mut self, group: &GroupByExpression) -> Option<Expr> {
        let property = &group.property;
        if property.name.trim().is_empty() {
            return None;
        }

        let column = self.column(property);
        if property.property_type != PropertyType::DateTime {
            return Some(column);
        }

        let interval = group
            .interval
            .as_ref()
            .map(|i| i.name.trim())
            .filter(|i| !i.is_empty())
            .or(self.ctx.options.default_interval.as_deref())
            .unwrap_or(catalog::default_interval());

        let width = if quote::is_template_variable(interval) {
            Expr::Variable(interval.trim().to_string())
        } else if quote::is_timespan_literal(interval) {
            Expr::Literal(Literal::TimeSpan(interval.trim().to_string()))
        } else {
            return Some(self.invalid(&property.name, property.property_type, interval));
        };

        Some(func("bin", vec![column, width]))
    }

    // ------------------------------------------------------------------------
    // Columns and values
    // ------------------------------------------------------------------------

    /// Column reference; paths into a `dynamic` column are converted to the
    /// property's type.
    fn column(&self, property: &Property) -> Expr {
        match self.ctx.schema.dynamic_path(&property.name) {
            Some((root, path)) => func(
                property.property_type.conversion_function(),
                vec![Expr::DynamicPath {
                    column: root.to_string(),
                    path: path.into_iter().map(String::from).collect(),
                }],
            ),
            None => col(&property.name),
        }
    }

    /// Cast a value to `ty`; `Err` carries the marker replacing it.
    fn literal(&mut self, name: &str, ty: PropertyType, value: &ScalarValue) -> Result<Expr, Expr> {
        cast_value(ty, value).ok_or_else(|| self.invalid(name, ty, &value.as_text()))
    }

    fn unsupported(&mut self, property: &Property, operator: &str) -> Expr {
        self.marker(CompileWarning::UnsupportedOperator {
            property: property.name.clone(),
            operator: operator.to_string(),
            property_type: property.property_type,
        })
    }

    fn invalid(&mut self, name: &str, ty: PropertyType, value: &str) -> Expr {
        self.marker(CompileWarning::InvalidValue {
            property: name.to_string(),
            value: value.to_string(),
            property_type: ty,
        })
    }

    fn marker(&mut self, warning: CompileWarning) -> Expr {
        let marker = Expr::Warning(warning.to_string());
        self.warnings.push(warning);
        marker
    }
}

fn function_source(database: Option<String>, name: &str) -> Source {
    if name.contains('(') {
        return Source::Raw(name.to_string());
    }
    Source::Function {
        database,
        name: name.to_string(),
    }
}

/// Format a value as a literal of type `ty`.
fn cast_value(ty: PropertyType, value: &ScalarValue) -> Option<Expr> {
    let text = value.as_text();
    let trimmed = text.trim();

    if ty != PropertyType::String && quote::is_template_variable(trimmed) {
        return Some(Expr::Variable(trimmed.to_string()));
    }

    let literal = match ty {
        PropertyType::String => Literal::String(text),
        PropertyType::Number => match value {
            ScalarValue::Number(n) => match n.as_i64() {
                Some(i) => Literal::Int(i),
                None => Literal::Float(n.as_f64().filter(|f| f.is_finite())?),
            },
            ScalarValue::String(_) => match trimmed.parse::<i64>() {
                Ok(i) => Literal::Int(i),
                Err(_) => Literal::Float(trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?),
            },
            ScalarValue::Bool(_) => return None,
        },
        PropertyType::Boolean => match value {
            ScalarValue::Bool(b) => Literal::Bool(*b),
            _ => Literal::Bool(quote::parse_bool(trimmed)?),
        },
        PropertyType::DateTime => {
            if quote::is_relative_time(trimmed) {
                return Some(Expr::Raw(trimmed.to_string()));
            }
            if !is_datetime(trimmed) {
                return None;
            }
            Literal::DateTime(trimmed.to_string())
        }
        PropertyType::TimeSpan => {
            if !quote::is_timespan_literal(trimmed) {
                return None;
            }
            Literal::TimeSpan(trimmed.to_string())
        }
        PropertyType::Function | PropertyType::Interval => return None,
    };

    Some(Expr::Literal(literal))
}

fn is_datetime(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
