//! Checked guard expressions and their evaluation.
use std::fmt;

use super::GuardError;
use super::parser::Syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }

    /// Structured-text spelling of the operator.
    pub fn as_st(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Rising (`rt`) or falling (`ft`) edge detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Rising,
    Falling,
}

impl EdgeKind {
    pub fn from_call(func: &str) -> Option<Self> {
        match func {
            "rt" => Some(EdgeKind::Rising),
            "ft" => Some(EdgeKind::Falling),
            _ => None,
        }
    }

    pub fn call_name(self) -> &'static str {
        match self {
            EdgeKind::Rising => "rt",
            EdgeKind::Falling => "ft",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.call_name())
    }
}

/// Read access to the input snapshot a guard is evaluated against.
///
/// Inputs are addressed by their position in the net's declared input list.
pub trait GuardEnv {
    fn value(&self, input: usize) -> f64;
    fn rising_edge(&self, input: usize) -> bool;
    fn falling_edge(&self, input: usize) -> bool;
}

/// Current and previous values, both in declared input order.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSnapshot<'a> {
    pub current: &'a [f64],
    pub previous: &'a [f64],
}

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

impl GuardEnv for EdgeSnapshot<'_> {
    fn value(&self, input: usize) -> f64 {
        self.current.get(input).copied().unwrap_or(0.0)
    }

    fn rising_edge(&self, input: usize) -> bool {
        let now = self.current.get(input).copied().unwrap_or(0.0);
        let before = self.previous.get(input).copied().unwrap_or(0.0);
        truthy(now) && !truthy(before)
    }

    fn falling_edge(&self, input: usize) -> bool {
        let now = self.current.get(input).copied().unwrap_or(0.0);
        let before = self.previous.get(input).copied().unwrap_or(0.0);
        truthy(before) && !truthy(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
}

impl Value {
    pub fn truthy(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Number(n) => truthy(n),
        }
    }

    pub fn as_number(self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::Number(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Number(f64),
    Input { name: String, index: usize },
    Edge { kind: EdgeKind, name: String, index: usize },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Checks every identifier and call against `inputs` and binds input
    /// references to their positions.
    pub fn resolve(syntax: Syntax, inputs: &[&str]) -> Result<Expr, GuardError> {
        let lookup = |name: &str| inputs.iter().position(|input| *input == name);
        let expr = match syntax {
            Syntax::Bool(b) => Expr::Bool(b),
            Syntax::Number(n) => Expr::Number(n),
            Syntax::Str(s) => return Err(GuardError::UnexpectedString(s)),
            Syntax::Ident(name) => match lookup(&name) {
                Some(index) => Expr::Input { name, index },
                None => return Err(GuardError::UndefinedInput(name)),
            },
            Syntax::Call { func, mut args } => {
                let kind = EdgeKind::from_call(&func).ok_or(GuardError::NotCallable(func.clone()))?;
                let arg = match (args.pop(), args.is_empty()) {
                    (Some(Syntax::Str(arg)), true) => arg,
                    _ => return Err(GuardError::EdgeArgument(func)),
                };
                match lookup(&arg) {
                    Some(index) => Expr::Edge {
                        kind,
                        name: arg,
                        index,
                    },
                    None => return Err(GuardError::InvalidEdgeInput { func, input: arg }),
                }
            }
            Syntax::Not(inner) => Expr::Not(Box::new(Expr::resolve(*inner, inputs)?)),
            Syntax::And(lhs, rhs) => Expr::And(
                Box::new(Expr::resolve(*lhs, inputs)?),
                Box::new(Expr::resolve(*rhs, inputs)?),
            ),
            Syntax::Or(lhs, rhs) => Expr::Or(
                Box::new(Expr::resolve(*lhs, inputs)?),
                Box::new(Expr::resolve(*rhs, inputs)?),
            ),
            Syntax::Cmp(op, lhs, rhs) => Expr::Cmp(
                op,
                Box::new(Expr::resolve(*lhs, inputs)?),
                Box::new(Expr::resolve(*rhs, inputs)?),
            ),
        };
        Ok(expr)
    }

    pub fn eval<E: GuardEnv + ?Sized>(&self, env: &E) -> Value {
        match self {
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Number(n) => Value::Number(*n),
            Expr::Input { index, .. } => Value::Number(env.value(*index)),
            Expr::Edge { kind, index, .. } => Value::Bool(match kind {
                EdgeKind::Rising => env.rising_edge(*index),
                EdgeKind::Falling => env.falling_edge(*index),
            }),
            Expr::Not(inner) => Value::Bool(!inner.eval(env).truthy()),
            Expr::And(lhs, rhs) => Value::Bool(lhs.eval(env).truthy() && rhs.eval(env).truthy()),
            Expr::Or(lhs, rhs) => Value::Bool(lhs.eval(env).truthy() || rhs.eval(env).truthy()),
            Expr::Cmp(op, lhs, rhs) => {
                Value::Bool(op.apply(lhs.eval(env).as_number(), rhs.eval(env).as_number()))
            }
        }
    }

    /// Edge-detector calls in left-to-right order, duplicates included.
    pub fn visit_edges<'a>(&'a self, out: &mut Vec<(EdgeKind, &'a str)>) {
        match self {
            Expr::Edge { kind, name, .. } => out.push((*kind, name)),
            Expr::Not(inner) => inner.visit_edges(out),
            Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) | Expr::Cmp(_, lhs, rhs) => {
                lhs.visit_edges(out);
                rhs.visit_edges(out);
            }
            Expr::Bool(_) | Expr::Number(_) | Expr::Input { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::parser::parse;

    fn compile(src: &str, inputs: &[&str]) -> Result<Expr, GuardError> {
        Expr::resolve(parse(src).unwrap(), inputs)
    }

    #[test]
    fn binds_inputs_by_declared_position() {
        let expr = compile("y and x", &["x", "y"]).unwrap();
        assert_eq!(
            expr,
            Expr::And(
                Box::new(Expr::Input { name: "y".into(), index: 1 }),
                Box::new(Expr::Input { name: "x".into(), index: 0 })
            )
        );
    }

    #[test]
    fn rejects_calls_other_than_edges() {
        assert_eq!(
            compile("max('x')", &["x"]),
            Err(GuardError::NotCallable("max".into()))
        );
        assert_eq!(
            compile("rt(x)", &["x"]),
            Err(GuardError::EdgeArgument("rt".into()))
        );
        assert_eq!(
            compile("ft('z')", &["x"]),
            Err(GuardError::InvalidEdgeInput {
                func: "ft".into(),
                input: "z".into()
            })
        );
    }

    #[test]
    fn comparisons_coerce_booleans() {
        let expr = compile("(x > 2) = 1", &["x"]).unwrap();
        let current = [3.0];
        let env = EdgeSnapshot {
            current: &current,
            previous: &current,
        };
        assert!(expr.eval(&env).truthy());
    }

    #[test]
    fn collects_edges_in_order() {
        let expr = compile("ft('b') or rt('a') and ft('b')", &["a", "b"]).unwrap();
        let mut edges = Vec::new();
        expr.visit_edges(&mut edges);
        assert_eq!(
            edges,
            vec![
                (EdgeKind::Falling, "b"),
                (EdgeKind::Rising, "a"),
                (EdgeKind::Falling, "b")
            ]
        );
    }
}
