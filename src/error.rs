use std::error::Error as StdError;
use std::fmt;

use crate::ValueType;

/// Error raised while loading or executing a Quad program, tagged with the
/// 1-based source line of the offending instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadError {
    pub lineno: u32,
    pub kind: ErrorKind,
}

impl QuadError {
    pub fn new(lineno: u32, kind: ErrorKind) -> QuadError {
        QuadError { lineno, kind }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    InvalidOp(String),
    InvalidOperand(String),
    WrongOperandCount {
        op: String,
        expected: usize,
        found: usize,
    },
    MissingHalt,
    VariableTypeMismatch {
        name: String,
        declared_at: u32,
        expected: ValueType,
        found: ValueType,
    },
    OperandTypeMismatch {
        expected: ValueType,
        found: ValueType,
    },
    UndefinedVariable(String),
    InvalidJumpTarget(String),
    DivisionByZero,
    Io(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::InvalidOp(op) => write!(f, "invalid op: '{}'", op),
            ErrorKind::InvalidOperand(oper) => write!(f, "invalid oper: '{}'", oper),
            ErrorKind::WrongOperandCount {
                op,
                expected,
                found,
            } => write!(
                f,
                "wrong number of operands for {}: expected {}, found {}",
                op, expected, found
            ),
            ErrorKind::MissingHalt => f.write_str("missing HALT"),
            ErrorKind::VariableTypeMismatch {
                name,
                declared_at,
                expected,
                found,
            } => write!(
                f,
                "type mismatch for variable '{}' (declared at line {}), expected {}, found {}",
                name, declared_at, expected, found
            ),
            ErrorKind::OperandTypeMismatch { expected, found } => write!(
                f,
                "type mismatch for operand, expected {}, found {}",
                expected, found
            ),
            ErrorKind::UndefinedVariable(name) => write!(f, "undefined variable '{}'", name),
            ErrorKind::InvalidJumpTarget(target) => {
                write!(f, "invalid instruction number: '{}'", target)
            }
            ErrorKind::DivisionByZero => f.write_str("division by zero"),
            ErrorKind::Io(msg) => write!(f, "input failed: {}", msg),
        }
    }
}

impl fmt::Display for QuadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.lineno, self.kind)
    }
}

impl StdError for QuadError {}
