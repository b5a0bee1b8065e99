//! The declarative-language layer of the scene object runtime: a token
//! stream over loaded world scripts, the global variable store, and the
//! boolean condition trees that gate object activation.

pub mod expression;
pub mod stream;
pub mod variable;

pub use expression::{evaluate, execute, ExprId, ExprOp, Expression};
pub use stream::{Point, Rect, ScriptStream, Size};
pub use variable::{Variable, VariableStore};

use thiserror::Error;

/// Error conditions raised by the script layer. Callers in the scene
/// parser treat these as non-fatal: the statement is reported and parsing
/// resynchronizes on the next statement boundary.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("unexpected end of script at line {line}")]
    UnexpectedEof { line: usize },
    #[error("malformed {what} literal at line {line}: '{found}'")]
    MalformedLiteral {
        what: &'static str,
        line: usize,
        found: String,
    },
    #[error("unknown operator '{found}' at line {line}")]
    UnknownOperator { found: String, line: usize },
    #[error("expected '(' to open an expression at line {line}")]
    MissingParen { line: usize },
    #[error("variable '{0}' is constant and cannot be written")]
    ConstantWrite(String),
    #[error("variable '{0}' is not declared")]
    UnknownVariable(String),
}
