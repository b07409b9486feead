//! Helpers for constructing expressions.
//!
//! Upstream clause planners (and this crate's tests) build predicate trees
//! with these instead of spelling out the enum variants.

use super::{
    Expression, FilterScope, FunctionInvocation, IterablePredicate, Literal, Operator,
    OperatorApplication,
};

/// Combine predicates with AND. Returns `None` for an empty input, the
/// predicate itself for a single input.
pub fn and(mut predicates: Vec<Expression>) -> Option<Expression> {
    match predicates.len() {
        0 => None,
        1 => predicates.pop(),
        _ => Some(Expression::OperatorApplicationExp(OperatorApplication {
            operator: Operator::And,
            operands: predicates,
        })),
    }
}

/// Negate a predicate.
pub fn not(predicate: Expression) -> Expression {
    Expression::OperatorApplicationExp(OperatorApplication {
        operator: Operator::Not,
        operands: vec![predicate],
    })
}

/// A variable reference.
pub fn var(name: impl Into<String>) -> Expression {
    Expression::Variable(name.into())
}

/// An integer literal.
pub fn int(value: i64) -> Expression {
    Expression::Literal(Literal::Integer(value))
}

/// Property access on a variable: `alias.key`.
///
/// # Example
/// ```ignore
/// let expr = prop("x", "prop");
/// // Equivalent to: x.prop
/// ```
pub fn prop(alias: impl Into<String>, key: impl Into<String>) -> Expression {
    Expression::PropertyAccess {
        subject: Box::new(Expression::Variable(alias.into())),
        key: key.into(),
    }
}

fn binary(operator: Operator, lhs: Expression, rhs: Expression) -> Expression {
    Expression::OperatorApplicationExp(OperatorApplication {
        operator,
        operands: vec![lhs, rhs],
    })
}

/// `lhs = rhs`
pub fn eq(lhs: Expression, rhs: Expression) -> Expression {
    binary(Operator::Equal, lhs, rhs)
}

/// `lhs > rhs`
pub fn gt(lhs: Expression, rhs: Expression) -> Expression {
    binary(Operator::GreaterThan, lhs, rhs)
}

/// `lhs < rhs`
pub fn lt(lhs: Expression, rhs: Expression) -> Expression {
    binary(Operator::LessThan, lhs, rhs)
}

/// A function invocation, e.g. `fn_call("length", vec![var("p")])`.
pub fn fn_call(name: impl Into<String>, args: Vec<Expression>) -> Expression {
    Expression::FunctionInvocation(FunctionInvocation {
        name: name.into(),
        args,
    })
}

/// `all(variable IN list WHERE inner)`
pub fn all_in(variable: impl Into<String>, list: Expression, inner: Expression) -> Expression {
    Expression::AllIterable(iterable(variable, list, inner))
}

/// `none(variable IN list WHERE inner)`
pub fn none_in(variable: impl Into<String>, list: Expression, inner: Expression) -> Expression {
    Expression::NoneIterable(iterable(variable, list, inner))
}

fn iterable(variable: impl Into<String>, list: Expression, inner: Expression) -> IterablePredicate {
    IterablePredicate {
        scope: FilterScope {
            variable: variable.into(),
            inner: Some(Box::new(inner)),
        },
        list: Box::new(list),
    }
}
