//! Filter operators.

use super::PropertyType;

/// How an operator lays out its operands in KQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorForm {
    /// `Col op value`
    Infix,
    /// `Col op (v1, v2, ...)`
    List,
    /// `Col op (low .. high)`
    Range,
    /// `op(Col)` - no operand
    Function,
}

/// A filter operator definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDef {
    pub name: &'static str,
    pub form: OperatorForm,
    /// Types this operator may be applied to.
    pub types: &'static [PropertyType],
}

impl OperatorDef {
    pub fn supports(&self, property_type: PropertyType) -> bool {
        self.types.contains(&property_type)
    }
}

use super::PropertyType as P;

const ORDERED: &[PropertyType] = &[P::Number, P::DateTime, P::TimeSpan];
const EQUATABLE: &[PropertyType] = &[P::Number, P::String, P::Boolean, P::DateTime, P::TimeSpan];
const TEXT: &[PropertyType] = &[P::String];
const ANY: &[PropertyType] = &[P::Number, P::String, P::Boolean, P::DateTime, P::TimeSpan];

const fn def(name: &'static str, form: OperatorForm, types: &'static [PropertyType]) -> OperatorDef {
    OperatorDef { name, form, types }
}

static OPERATORS: &[OperatorDef] = &[
    def("==", OperatorForm::Infix, EQUATABLE),
    def("!=", OperatorForm::Infix, EQUATABLE),
    def(">", OperatorForm::Infix, ORDERED),
    def(">=", OperatorForm::Infix, ORDERED),
    def("<", OperatorForm::Infix, ORDERED),
    def("<=", OperatorForm::Infix, ORDERED),
    def("=~", OperatorForm::Infix, TEXT),
    def("!~", OperatorForm::Infix, TEXT),
    def("contains", OperatorForm::Infix, TEXT),
    def("!contains", OperatorForm::Infix, TEXT),
    def("contains_cs", OperatorForm::Infix, TEXT),
    def("startswith", OperatorForm::Infix, TEXT),
    def("!startswith", OperatorForm::Infix, TEXT),
    def("endswith", OperatorForm::Infix, TEXT),
    def("!endswith", OperatorForm::Infix, TEXT),
    def("has", OperatorForm::Infix, TEXT),
    def("!has", OperatorForm::Infix, TEXT),
    def("matches regex", OperatorForm::Infix, TEXT),
    def("in", OperatorForm::List, &[P::Number, P::String]),
    def("!in", OperatorForm::List, &[P::Number, P::String]),
    def("in~", OperatorForm::List, TEXT),
    def("has_any", OperatorForm::List, TEXT),
    def("has_all", OperatorForm::List, TEXT),
    def("between", OperatorForm::Range, ORDERED),
    def("!between", OperatorForm::Range, ORDERED),
    def("isempty", OperatorForm::Function, TEXT),
    def("isnotempty", OperatorForm::Function, TEXT),
    def("isnull", OperatorForm::Function, ANY),
    def("isnotnull", OperatorForm::Function, ANY),
];

/// Look up an operator by name.
pub fn operator(name: &str) -> Option<&'static OperatorDef> {
    OPERATORS.iter().find(|o| o.name == name.trim())
}

/// Operators legal for a property type, in catalog order.
pub fn operators_for(property_type: PropertyType) -> Vec<&'static OperatorDef> {
    OPERATORS.iter().filter(|o| o.supports(property_type)).collect()
}
