//! Guard compiler.
//!
//! A guard is a boolean expression over the net's declared inputs, e.g.
//! `start and not stop`, `level >= 3 or rt('button')`. Compilation decodes
//! HTML entities left behind by the editor, parses the text into an
//! expression tree and checks every identifier against the declared input
//! names, so that a bad guard fails when its net is assembled rather than
//! in the middle of a simulation.
//!
//! ```rust
//! use rust_apn::guard::{EdgeSnapshot, Guard};
//!
//! let guard = Guard::compile(Some("rt('y') and x"), &["x", "y"]).unwrap();
//! let env = EdgeSnapshot { current: &[1.0, 1.0], previous: &[1.0, 0.0] };
//! assert!(guard.evaluate(&env));
//! ```

pub mod ast;
pub mod parser;

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

pub use ast::{CmpOp, EdgeKind, EdgeSnapshot, Expr, GuardEnv, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("syntax error at column {column} of \"{guard}\"")]
    Syntax { guard: String, column: usize },
    #[error("the input \"{0}\" was not defined")]
    UndefinedInput(String),
    #[error("\"{0}\" is not callable")]
    NotCallable(String),
    #[error("\"{0}\" expects a single quoted input name")]
    EdgeArgument(String),
    #[error("the input of a \"{func}\" call must be a net input name, got \"{input}\"")]
    InvalidEdgeInput { func: String, input: String },
    #[error("unexpected string literal '{0}'")]
    UnexpectedString(String),
}

impl GuardError {
    /// The identifier the error is about, if any.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            GuardError::UndefinedInput(name)
            | GuardError::NotCallable(name)
            | GuardError::EdgeArgument(name) => Some(name),
            GuardError::InvalidEdgeInput { input, .. } => Some(input),
            GuardError::Syntax { .. } | GuardError::UnexpectedString(_) => None,
        }
    }
}

static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(gt|lt|amp|quot|apos);").unwrap());

/// Replaces the HTML entities the editor stores in guard text.
pub fn decode_entities(guard: &str) -> Cow<'_, str> {
    ENTITY.replace_all(guard, |caps: &Captures| match &caps[1] {
        "gt" => ">",
        "lt" => "<",
        "amp" => "&",
        "quot" => "\"",
        _ => "'",
    })
}

/// A compiled transition guard. An absent guard always holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Guard {
    source: Option<String>,
    expr: Option<Expr>,
}

impl Guard {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn compile(source: Option<&str>, inputs: &[&str]) -> Result<Self, GuardError> {
        let Some(source) = source.filter(|s| !s.trim().is_empty()) else {
            return Ok(Self::always());
        };
        let decoded = decode_entities(source);
        let syntax = parser::parse(&decoded).map_err(|failure| GuardError::Syntax {
            guard: source.to_owned(),
            column: failure.offset + 1,
        })?;
        let expr = Expr::resolve(syntax, inputs)?;
        Ok(Self {
            source: Some(source.to_owned()),
            expr: Some(expr),
        })
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    pub fn evaluate<E: GuardEnv + ?Sized>(&self, env: &E) -> bool {
        self.expr.as_ref().is_none_or(|expr| expr.eval(env).truthy())
    }

    /// Distinct `(kind, input)` edge calls in first-seen order.
    pub fn edge_triggers(&self) -> Vec<(EdgeKind, &str)> {
        let mut all = Vec::new();
        if let Some(expr) = &self.expr {
            expr.visit_edges(&mut all);
        }
        let mut seen = Vec::with_capacity(all.len());
        for edge in all {
            if !seen.contains(&edge) {
                seen.push(edge);
            }
        }
        seen
    }
}
