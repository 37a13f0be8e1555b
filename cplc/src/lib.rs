//! Compiler for the CPL language, targeting the [quad](../quad/index.html)
//! virtual machine.
//!
//! The main function provided by this crate is [`compile`](fn.compile.html),
//! which accepts CPL source text and outputs the program as Quad
//! three-address code, ready to be loaded and executed by the VM.
//!
//! Parsing is implemented using [pest]; lexical and syntax errors are pest
//! errors with all of pest's pretty formatting available. Semantic errors
//! are collected with their source line numbers: the compiler recovers at
//! statement granularity, so one run can report several of them, and no
//! code is produced if any were found.
//!
//! # The CPL Language
//!
//! A program is a declarations section followed by a statement block:
//!
//! ```text
//! a, b: int;
//! x: float;
//! {
//!     input(a);
//!     x = a / 2 + 0.5;
//!     while (x > 1.0) {
//!         output(x);
//!         x = x / 2.0;
//!     }
//! }
//! ```
//!
//! There are two types, `int` and `float`. Arithmetic (`+ - * /`) promotes
//! to `float` when either operand is `float`; assigning a `float` into an
//! `int` variable is rejected unless an explicit `static_cast<int>(...)`
//! (truncation toward zero) is written. `static_cast<float>(...)` widens.
//!
//! Statements are assignment, `input(id)`, `output(expr)`,
//! `if (...) ... else ...`, `while (...) ...`, `switch` over an `int`
//! expression with `case n:` arms and a mandatory `default:` (no
//! fall-through between cases), `break` (targets the innermost enclosing
//! `while`), and `{ ... }` blocks. Conditions are boolean expressions
//! built from comparisons (`== != < > <= >=`), `&&`, `||` and `!(...)`;
//! there is no boolean variable type. Comments are `/* ... */` and may
//! span lines.
//!
//! # Generated Code
//!
//! Every variable keeps its source name in the emitted Quad code.
//! Intermediate results go through temporaries `t0, t1, ...`: `t0` and
//! `t1` are the shared int and float accumulators that arithmetic,
//! comparison and boolean instructions write into, and further
//! temporaries are allocated whenever a value has to survive the
//! evaluation of a sibling sub-expression. Control flow is emitted
//! against symbolic labels `l0, l1, ...` which a final backpatching pass
//! replaces with concrete 1-based instruction indices.
//!
//! [pest]: https://docs.rs/pest/

pub mod ast;
mod codegen;
mod compiler;
mod error;
mod parser;
mod symbol_table;

#[cfg(test)]
mod test;

use std::fmt;

pub use crate::compiler::Compiler;
pub use crate::error::{CompileError, ErrorKind};
pub use crate::parser::{parse, ParseError, Rule};
pub use crate::symbol_table::{Symbol, SymbolTable};

#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Semantic(Vec<CompileError>),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => {
                let line = match err.line_col {
                    pest::error::LineColLocation::Pos((line, _)) => line,
                    pest::error::LineColLocation::Span((line, _), _) => line,
                };
                let message = match &err.variant {
                    pest::error::ErrorVariant::CustomError { message } => message.as_str(),
                    pest::error::ErrorVariant::ParsingError { .. } => "syntax error",
                };
                write!(f, "error in line {}: {}", line, message)
            }
            Error::Semantic(errors) => {
                let mut first = true;
                for err in errors {
                    if !first {
                        writeln!(f)?;
                    }
                    write!(f, "{}", err)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// Compiles CPL source text to Quad code, with labels already resolved to
/// instruction indices.
pub fn compile(input: &str) -> Result<String, Error> {
    let program = parser::parse(input)?;
    Compiler::new().run(&program).map_err(Error::Semantic)
}
