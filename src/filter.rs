//! Generic boolean filter expressions supplied by the calling environment.
//!
//! A filter is a small AST of binary comparisons over field references and
//! literal values, combined with conjunction. Books consume a filter by
//! running a [`FilterVisitor`] over it and translating the recognized
//! comparisons into provider-specific query parameters.

use crate::error::FilterError;
use crate::phrase::NounPhrase;
use crate::value::Value;

/// Operator of a binary filter node.
///
/// Only a subset is meaningful to any given book; visitors reject the rest
/// with [`FilterError::UnsupportedOperator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
    And,
    Or,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BinaryOperator::Equals => "equals",
            BinaryOperator::NotEquals => "not-equals",
            BinaryOperator::GreaterThan => "greater-than",
            BinaryOperator::GreaterThanOrEquals => "greater-than-or-equals",
            BinaryOperator::LessThan => "less-than",
            BinaryOperator::LessThanOrEquals => "less-than-or-equals",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        };
        f.write_str(name)
    }
}

/// Operator of a unary filter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Not => f.write_str("not"),
        }
    }
}

/// A node in a filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// A binary operation over two subtrees.
    Binary {
        operator: BinaryOperator,
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    /// A unary operation over one subtree.
    Unary {
        operator: UnaryOperator,
        operand: Box<FilterExpr>,
    },
    /// A reference to one or more fields by phrase. Well-formed comparisons
    /// reference exactly one field; visitors reject anything else.
    Fields(Vec<NounPhrase>),
    /// A literal scalar value.
    Literal(Value),
}

impl FilterExpr {
    /// A single-field reference.
    pub fn field(phrase: impl Into<NounPhrase>) -> Self {
        FilterExpr::Fields(vec![phrase.into()])
    }

    /// A literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        FilterExpr::Literal(value.into())
    }

    /// A binary comparison between a field reference and a literal.
    pub fn compare(
        operator: BinaryOperator,
        field: impl Into<NounPhrase>,
        value: impl Into<Value>,
    ) -> Self {
        FilterExpr::Binary {
            operator,
            left: Box::new(Self::field(field)),
            right: Box::new(Self::literal(value)),
        }
    }

    /// `field == value`.
    pub fn equals(field: impl Into<NounPhrase>, value: impl Into<Value>) -> Self {
        Self::compare(BinaryOperator::Equals, field, value)
    }

    /// `field > value`.
    pub fn greater_than(field: impl Into<NounPhrase>, value: impl Into<Value>) -> Self {
        Self::compare(BinaryOperator::GreaterThan, field, value)
    }

    /// `field < value`.
    pub fn less_than(field: impl Into<NounPhrase>, value: impl Into<Value>) -> Self {
        Self::compare(BinaryOperator::LessThan, field, value)
    }

    /// Conjunction of two subtrees.
    pub fn and(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Binary {
            operator: BinaryOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Dispatch this node to the visitor.
    ///
    /// Traversal order for binary nodes (left before right, then the
    /// operator) is the visitor's responsibility; `accept` only routes each
    /// node kind to the matching callback.
    pub fn accept<V: FilterVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), FilterError> {
        match self {
            FilterExpr::Binary {
                operator,
                left,
                right,
            } => visitor.visit_binary(*operator, left, right),
            FilterExpr::Unary { operator, operand } => visitor.visit_unary(*operator, operand),
            FilterExpr::Fields(phrases) => visitor.visit_fields(phrases),
            FilterExpr::Literal(value) => visitor.visit_literal(value),
        }
    }
}

/// Walks a filter expression tree, translating recognized comparisons.
pub trait FilterVisitor {
    /// Visit a binary node. Implementations visit both subtrees, then apply
    /// the operator to whatever field/value state the subtrees left behind.
    fn visit_binary(
        &mut self,
        operator: BinaryOperator,
        left: &FilterExpr,
        right: &FilterExpr,
    ) -> Result<(), FilterError>;

    /// Visit a unary node. Unary operators carry no filter information for
    /// any current book, so the default is a no-op.
    fn visit_unary(
        &mut self,
        _operator: UnaryOperator,
        _operand: &FilterExpr,
    ) -> Result<(), FilterError> {
        Ok(())
    }

    /// Visit a field reference.
    fn visit_fields(&mut self, phrases: &[NounPhrase]) -> Result<(), FilterError>;

    /// Visit a literal value.
    fn visit_literal(&mut self, value: &Value) -> Result<(), FilterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the order in which nodes are visited.
    #[derive(Default)]
    struct Tracer {
        events: Vec<String>,
    }

    impl FilterVisitor for Tracer {
        fn visit_binary(
            &mut self,
            operator: BinaryOperator,
            left: &FilterExpr,
            right: &FilterExpr,
        ) -> Result<(), FilterError> {
            left.accept(self)?;
            right.accept(self)?;
            self.events.push(format!("op:{operator}"));
            Ok(())
        }

        fn visit_fields(&mut self, phrases: &[NounPhrase]) -> Result<(), FilterError> {
            self.events.push(format!("field:{}", phrases[0]));
            Ok(())
        }

        fn visit_literal(&mut self, value: &Value) -> Result<(), FilterError> {
            self.events.push(format!("value:{value}"));
            Ok(())
        }
    }

    #[test]
    fn binary_nodes_visit_left_then_right() {
        let expr = FilterExpr::and(
            FilterExpr::equals("sender number", "+1800"),
            FilterExpr::equals("recipient number", "+1900"),
        );
        let mut tracer = Tracer::default();
        expr.accept(&mut tracer).unwrap();
        assert_eq!(
            tracer.events,
            vec![
                "field:sender number",
                "value:+1800",
                "op:equals",
                "field:recipient number",
                "value:+1900",
                "op:equals",
                "op:and",
            ]
        );
    }

    #[test]
    fn compare_builds_field_and_literal() {
        let expr = FilterExpr::less_than("date sent", 5.0);
        match expr {
            FilterExpr::Binary {
                operator,
                left,
                right,
            } => {
                assert_eq!(operator, BinaryOperator::LessThan);
                assert_eq!(*left, FilterExpr::field("date sent"));
                assert_eq!(*right, FilterExpr::literal(5.0));
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }
}
