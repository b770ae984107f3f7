use std::fmt;

use serde::Serialize;

use crate::error::RenderError;
use crate::lexer::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Helper {
    If,
    Unless,
    Each,
    With,
}

impl Helper {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "if" => Some(Helper::If),
            "unless" => Some(Helper::Unless),
            "each" => Some(Helper::Each),
            "with" => Some(Helper::With),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Helper::If => "if",
            Helper::Unless => "unless",
            Helper::Each => "each",
            Helper::With => "with",
        }
    }

    /// `unless` shows its consequent when the condition is false.
    pub fn inverted(self) -> bool {
        matches!(self, Helper::Unless)
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

type CompareFn = fn(&str, &str) -> Option<bool>;

/// The fixed set of comparison helpers. Lookup by name goes through this
/// table; there is no way to register more.
pub static BUILTIN_OPERATORS: [(&str, CompareOp, CompareFn); 6] = [
    ("eq", CompareOp::Eq, |l, r| Some(l == r)),
    ("ne", CompareOp::Ne, |l, r| Some(l != r)),
    ("gt", CompareOp::Gt, |l, r| numeric(l, r, |a, b| a > b)),
    ("gte", CompareOp::Gte, |l, r| numeric(l, r, |a, b| a >= b)),
    ("lt", CompareOp::Lt, |l, r| numeric(l, r, |a, b| a < b)),
    ("lte", CompareOp::Lte, |l, r| numeric(l, r, |a, b| a <= b)),
];

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn numeric(lhs: &str, rhs: &str, cmp: fn(f64, f64) -> bool) -> Option<bool> {
    Some(cmp(parse_number(lhs)?, parse_number(rhs)?))
}

impl CompareOp {
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTIN_OPERATORS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, op, _)| *op)
    }

    pub fn name(self) -> &'static str {
        self.entry().0
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    fn entry(self) -> &'static (&'static str, CompareOp, CompareFn) {
        // Table order follows declaration order.
        &BUILTIN_OPERATORS[self as usize]
    }

    /// Compare a resolved variable against a literal.
    ///
    /// `lhs` is `None` when the variable did not resolve. String operators
    /// treat that as unequal to everything; numeric operators reject it.
    pub fn apply(self, key: &str, lhs: Option<&str>, literal: &str) -> Result<bool, RenderError> {
        let invalid = || RenderError::InvalidComparisonOperand {
            key: key.to_string(),
            op: self,
            lhs: lhs.map(str::to_string),
            literal: literal.to_string(),
        };
        match (self, lhs) {
            (CompareOp::Eq, None) => Ok(false),
            (CompareOp::Ne, None) => Ok(true),
            (_, None) => Err(invalid()),
            (_, Some(lhs)) => (self.entry().2)(lhs, literal).ok_or_else(invalid),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Condition {
    Truthy { key: String },
    Compare { op: CompareOp, key: String, literal: String },
    Logical { op: LogicalOp, keys: Vec<String> },
    Not { key: String },
}

impl Condition {
    /// Variable keys the condition reads, in source order.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Condition::Truthy { key } | Condition::Compare { key, .. } | Condition::Not { key } => {
                vec![key.as_str()]
            }
            Condition::Logical { keys, .. } => keys.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Text(String),
    Variable {
        key: String,
    },
    Block {
        helper: Helper,
        condition: Condition,
        consequent: Vec<NodeId>,
        alternate: Option<Vec<NodeId>>,
        open_span: Span,
        else_span: Option<Span>,
        close_span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// A parsed template. Nodes live in a flat arena; `root` lists the
/// top-level children in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub source: String,
    pub nodes: Vec<Node>,
    pub root: Vec<NodeId>,
}

impl Template {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Source text covered by `span`.
    pub fn slice(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_table_round_trips_names() {
        for (name, op, _) in BUILTIN_OPERATORS.iter() {
            assert_eq!(CompareOp::from_name(name), Some(*op));
            assert_eq!(op.name(), *name);
        }
        assert_eq!(CompareOp::from_name("contains"), None);
    }

    #[test]
    fn string_operators_on_missing_value() {
        assert_eq!(CompareOp::Eq.apply("k", None, "x"), Ok(false));
        assert_eq!(CompareOp::Ne.apply("k", None, "x"), Ok(true));
    }

    #[test]
    fn numeric_operators_parse_both_sides() {
        assert_eq!(CompareOp::Gt.apply("age", Some("30"), "18"), Ok(true));
        assert_eq!(CompareOp::Lte.apply("age", Some(" 18 "), "18"), Ok(true));
        assert_eq!(CompareOp::Lt.apply("age", Some("2.5"), "10"), Ok(true));
        // "10" > "9" numerically even though it sorts lower as text
        assert_eq!(CompareOp::Gte.apply("n", Some("10"), "9"), Ok(true));
    }

    #[test]
    fn numeric_operators_reject_non_numbers() {
        assert!(CompareOp::Gt.apply("age", Some("old"), "18").is_err());
        assert!(CompareOp::Gt.apply("age", Some(""), "18").is_err());
        assert!(CompareOp::Gt.apply("age", Some("30"), "many").is_err());
        assert!(CompareOp::Gt.apply("age", None, "18").is_err());
    }

    #[test]
    fn eq_is_string_equality() {
        assert_eq!(CompareOp::Eq.apply("n", Some("1.0"), "1"), Ok(false));
        assert_eq!(CompareOp::Eq.apply("n", Some("formal"), "formal"), Ok(true));
    }
}
