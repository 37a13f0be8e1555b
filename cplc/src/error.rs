use std::error::Error as StdError;
use std::fmt;

/// A semantic error, reported against the source line of the statement or
/// declaration it occurred in. Errors abort the current statement only;
/// the compiler keeps going so several can be reported per run.
#[derive(Clone, PartialEq, Debug)]
pub struct CompileError {
    pub line: u32,
    pub kind: ErrorKind,
}

impl CompileError {
    pub fn new(line: u32, kind: ErrorKind) -> CompileError {
        CompileError { line, kind }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ErrorKind {
    AlreadyDeclared(String),
    NotFound(String),
    UsedBeforeAssigned(String),
    TypeMismatch(String),
    BreakOutsideLoop,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::AlreadyDeclared(name) => {
                write!(f, "symbol `{}` already exists in the symbol table", name)
            }
            ErrorKind::NotFound(name) => {
                write!(f, "symbol `{}` not found in the symbol table", name)
            }
            ErrorKind::UsedBeforeAssigned(name) => {
                write!(f, "symbol `{}` is used before assigned a value", name)
            }
            ErrorKind::TypeMismatch(msg) => f.write_str(msg),
            ErrorKind::BreakOutsideLoop => {
                f.write_str("got `break` statement outside a while loop")
            }
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "error in line {}: {}", self.line, self.kind)
    }
}

impl StdError for CompileError {}
