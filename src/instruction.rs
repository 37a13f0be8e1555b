use std::fmt;
use std::str::FromStr;

use crate::{ErrorKind, Float, Int, QuadError};

macro_rules! opcodes {
    ($( $name:ident => $arity:expr ),* $(,)?) => {
        /// The Quad instruction set. `I*` opcodes operate on integers,
        /// `R*` opcodes on floats; comparison results are always integers.
        #[derive(Clone, Copy, PartialEq, Eq, Debug)]
        pub enum Opcode {
            $( $name ),*
        }

        impl Opcode {
            /// Number of operands the opcode requires.
            pub fn arity(self) -> usize {
                match self {
                    $( Opcode::$name => $arity ),*
                }
            }
        }

        impl FromStr for Opcode {
            type Err = ();

            fn from_str(s: &str) -> Result<Opcode, ()> {
                match s {
                    $( stringify!($name) => Ok(Opcode::$name), )*
                    _ => Err(()),
                }
            }
        }
    };
}

opcodes! {
    IASN => 2,
    IPRT => 1,
    IINP => 1,
    IEQL => 3,
    INQL => 3,
    ILSS => 3,
    IGRT => 3,
    IADD => 3,
    ISUB => 3,
    IMLT => 3,
    IDIV => 3,
    RASN => 2,
    RPRT => 1,
    RINP => 1,
    REQL => 3,
    RNQL => 3,
    RLSS => 3,
    RGRT => 3,
    RADD => 3,
    RSUB => 3,
    RMLT => 3,
    RDIV => 3,
    ITOR => 2,
    RTOI => 2,
    JUMP => 1,
    JMPZ => 2,
    HALT => 0,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The two primitive Quad value types.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ValueType {
    Int,
    Float,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
        }
    }
}

/// A runtime value.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Value {
    Int(Int),
    Float(Float),
}

impl Value {
    pub fn value_type(self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            // Shortest round-trip form, so 1.0 prints as "1.0" and not "1".
            Value::Float(value) => write!(f, "{:?}", value),
        }
    }
}

/// An instruction operand as it appears in the source text: a name or a
/// typed literal.
#[derive(Clone, PartialEq, Debug)]
pub enum Operand {
    Id(String),
    Int(Int),
    Float(Float),
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_int_literal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_literal(token: &str) -> bool {
    let mut parts = token.splitn(2, '.');
    match (parts.next(), parts.next()) {
        (Some(whole), Some(frac)) => {
            is_int_literal(whole) && frac.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

impl Operand {
    fn parse(token: &str, lineno: u32) -> Result<Operand, QuadError> {
        if is_identifier(token) {
            Ok(Operand::Id(token.to_owned()))
        } else if is_int_literal(token) {
            token
                .parse()
                .map(Operand::Int)
                .map_err(|_| QuadError::new(lineno, ErrorKind::InvalidOperand(token.to_owned())))
        } else if is_float_literal(token) {
            token
                .parse()
                .map(Operand::Float)
                .map_err(|_| QuadError::new(lineno, ErrorKind::InvalidOperand(token.to_owned())))
        } else {
            Err(QuadError::new(
                lineno,
                ErrorKind::InvalidOperand(token.to_owned()),
            ))
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Id(name) => f.write_str(name),
            Operand::Int(value) => write!(f, "{}", value),
            Operand::Float(value) => write!(f, "{:?}", value),
        }
    }
}

/// One parsed Quad instruction, keeping its source line for diagnostics and
/// its stripped text for trace output.
#[derive(Clone, PartialEq, Debug)]
pub struct Instruction {
    pub op: Opcode,
    pub operands: Vec<Operand>,
    pub lineno: u32,
    pub text: String,
}

impl Instruction {
    /// Parses a single comment-stripped, non-empty line.
    pub fn parse(line: &str, lineno: u32) -> Result<Instruction, QuadError> {
        let mut tokens = line.split_whitespace();
        let op_token = tokens.next().unwrap_or("");

        if !op_token.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(QuadError::new(
                lineno,
                ErrorKind::InvalidOp(op_token.to_owned()),
            ));
        }
        let op: Opcode = op_token
            .parse()
            .map_err(|()| QuadError::new(lineno, ErrorKind::InvalidOp(op_token.to_owned())))?;

        let operands = tokens
            .map(|token| Operand::parse(token, lineno))
            .collect::<Result<Vec<_>, _>>()?;

        if operands.len() != op.arity() {
            return Err(QuadError::new(
                lineno,
                ErrorKind::WrongOperandCount {
                    op: op_token.to_owned(),
                    expected: op.arity(),
                    found: operands.len(),
                },
            ));
        }

        Ok(Instruction {
            op,
            operands,
            lineno,
            text: line.to_owned(),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}
