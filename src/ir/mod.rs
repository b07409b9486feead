//! Expression IR consumed by the planner.
//!
//! This is the predicate/expression subset a shortest-path request can carry:
//! variables, literals, property access, operator applications, function
//! invocations, and the quantified `all()`/`none()` forms that decide whether
//! a predicate can be checked incrementally during traversal. Expressions
//! arrive here already parsed; this crate never sees query text.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub mod combinators;

/// Position of a token in the original query text, carried for diagnostics
/// and notifications.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct InputPosition {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl InputPosition {
    pub const NONE: InputPosition = InputPosition {
        offset: 0,
        line: 0,
        column: 0,
    };

    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for InputPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
    Either,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Incoming => f.write_str("incoming"),
            Direction::Outgoing => f.write_str("outgoing"),
            Direction::Either => f.write_str("either"),
        }
    }
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Incoming => Direction::Outgoing,
            Direction::Outgoing => Direction::Incoming,
            Direction::Either => Direction::Either,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Operator {
    And,
    Or,
    Not,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    In,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::In => "IN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// A variable reference, e.g. `p` or `r`.
    Variable(String),

    Literal(Literal),

    /// A parameter, such as `$param`.
    Parameter(String),

    /// Property access, e.g. `x.prop`.
    PropertyAccess {
        subject: Box<Expression>,
        key: String,
    },

    /// An operator application, e.g. `1 + 2` or `length(p) > 3`.
    OperatorApplicationExp(OperatorApplication),

    /// A function invocation, e.g. `length(p)` or `nodes(p)`.
    FunctionInvocation(FunctionInvocation),

    /// A list literal: a vector of expressions.
    List(Vec<Expression>),

    /// Universal quantification: `all(x IN list WHERE predicate)`.
    AllIterable(IterablePredicate),

    /// Negated existential quantification: `none(x IN list WHERE predicate)`.
    NoneIterable(IterablePredicate),

    /// A path value built from already-bound nodes and relationships.
    /// Produced by the planner when a full path must be materialized; never
    /// present in user predicates.
    PathExpression(PathStep),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OperatorApplication {
    pub operator: Operator,
    pub operands: Vec<Expression>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FunctionInvocation {
    pub name: String,
    pub args: Vec<Expression>,
}

/// The quantified part of `all(...)`/`none(...)`: the bound iteration
/// variable, the optional inner predicate, and the iterated list.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct IterablePredicate {
    pub scope: FilterScope,
    pub list: Box<Expression>,
}

/// Scope of a quantifier. The variable is bound inside `inner` and is not a
/// free dependency of the enclosing expression.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FilterScope {
    pub variable: String,
    pub inner: Option<Box<Expression>>,
}

/// One step of a materialized path value: an alternating node/relationship
/// chain terminated by `Nil`. `MultiRelationship` covers a variable-length
/// segment whose relationship variable is list-valued at runtime.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum PathStep {
    Node {
        node: String,
        next: Box<PathStep>,
    },
    SingleRelationship {
        rel: String,
        direction: Direction,
        to_node: String,
        next: Box<PathStep>,
    },
    MultiRelationship {
        rel: String,
        direction: Direction,
        to_node: String,
        next: Box<PathStep>,
    },
    Nil,
}

impl Expression {
    /// Free variables of this expression. Quantifier-bound variables are not
    /// free: in `all(x IN nodes(p) WHERE x.prop > 0)` the dependencies are
    /// `{p}`, not `{x, p}`.
    pub fn dependencies(&self) -> HashSet<String> {
        let mut deps = HashSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut HashSet<String>) {
        match self {
            Expression::Variable(name) => {
                deps.insert(name.clone());
            }
            Expression::Literal(_) | Expression::Parameter(_) => {}
            Expression::PropertyAccess { subject, .. } => {
                subject.collect_dependencies(deps);
            }
            Expression::OperatorApplicationExp(op_app) => {
                for operand in &op_app.operands {
                    operand.collect_dependencies(deps);
                }
            }
            Expression::FunctionInvocation(call) => {
                for arg in &call.args {
                    arg.collect_dependencies(deps);
                }
            }
            Expression::List(items) => {
                for item in items {
                    item.collect_dependencies(deps);
                }
            }
            Expression::AllIterable(iterable) | Expression::NoneIterable(iterable) => {
                iterable.list.collect_dependencies(deps);
                if let Some(inner) = &iterable.scope.inner {
                    let mut inner_deps = HashSet::new();
                    inner.collect_dependencies(&mut inner_deps);
                    inner_deps.remove(&iterable.scope.variable);
                    deps.extend(inner_deps);
                }
            }
            Expression::PathExpression(step) => {
                step.collect_dependencies(deps);
            }
        }
    }
}

impl PathStep {
    fn collect_dependencies(&self, deps: &mut HashSet<String>) {
        match self {
            PathStep::Node { node, next } => {
                deps.insert(node.clone());
                next.collect_dependencies(deps);
            }
            PathStep::SingleRelationship {
                rel, to_node, next, ..
            }
            | PathStep::MultiRelationship {
                rel, to_node, next, ..
            } => {
                deps.insert(rel.clone());
                deps.insert(to_node.clone());
                next.collect_dependencies(deps);
            }
            PathStep::Nil => {}
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Variable(name) => f.write_str(name),
            Expression::Literal(lit) => match lit {
                Literal::Integer(i) => write!(f, "{i}"),
                Literal::Float(x) => write!(f, "{x}"),
                Literal::Boolean(b) => write!(f, "{b}"),
                Literal::String(s) => write!(f, "'{s}'"),
                Literal::Null => f.write_str("null"),
            },
            Expression::Parameter(name) => write!(f, "${name}"),
            Expression::PropertyAccess { subject, key } => write!(f, "{subject}.{key}"),
            Expression::OperatorApplicationExp(op_app) => match op_app.operands.as_slice() {
                [operand] => write!(f, "{} {}", op_app.operator, operand),
                [lhs, rhs] => write!(f, "{} {} {}", lhs, op_app.operator, rhs),
                operands => {
                    let rendered: Vec<String> = operands.iter().map(|o| o.to_string()).collect();
                    write!(f, "{}", rendered.join(&format!(" {} ", op_app.operator)))
                }
            },
            Expression::FunctionInvocation(call) => {
                let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", call.name, args.join(", "))
            }
            Expression::List(items) => {
                let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Expression::AllIterable(iterable) => write_iterable(f, "all", iterable),
            Expression::NoneIterable(iterable) => write_iterable(f, "none", iterable),
            Expression::PathExpression(_) => f.write_str("path(..)"),
        }
    }
}

fn write_iterable(
    f: &mut fmt::Formatter<'_>,
    quantifier: &str,
    iterable: &IterablePredicate,
) -> fmt::Result {
    write!(f, "{}({} IN {}", quantifier, iterable.scope.variable, iterable.list)?;
    if let Some(inner) = &iterable.scope.inner {
        write!(f, " WHERE {inner}")?;
    }
    f.write_str(")")
}
