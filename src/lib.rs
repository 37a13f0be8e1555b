//! Virtual machine for the Quad intermediate representation.
//!
//! Quad is a flat, textual three-address code: one instruction per line,
//! whitespace-separated operands, 1-based instruction indices as jump
//! targets. It is the output format of the [cplc](../cplc/index.html)
//! compiler, but programs can just as well be written by hand.
//!
//! The main types provided by this crate are [`Program`](struct.Program.html),
//! which parses Quad text into a typed instruction vector, and
//! [`Interpreter`](struct.Interpreter.html), which executes a program against
//! arbitrary input/output streams.
//!
//! # Quad Text Format
//!
//! A source line holds at most one instruction. Comments (`#` to end of
//! line, or `/* ... */` which may span lines) are stripped, blank lines are
//! skipped, and a leading `N:` index token (as produced by the compiler's
//! listing dump) is tolerated and ignored; the authoritative index of an
//! instruction is its position in the stripped stream, counting from 1.
//! Loading stops at the first `HALT`; a program without one is rejected.
//!
//! Operands are names, integer literals (`[0-9]+`) or float literals
//! (`[0-9]+.[0-9]*`). A name is declared by the first instruction that
//! writes to it, which also fixes its type; every later read or write of
//! that name is checked against the declared type.
//!
//! ## Instructions
//!
//! Typed opcodes come in pairs: an `I` prefix for integer operands and an
//! `R` prefix for float ("real") operands.
//!
//!  Mnemonic        | Shape   | Effect
//! -----------------|---------|----------------------------------------------
//! `IASN`/`RASN`    | `a b`   | `a := b`
//! `IPRT`/`RPRT`    | `b`     | print the value of `b`
//! `IINP`/`RINP`    | `a`     | read a value into `a`
//! `IEQL`/`REQL`    | `a b c` | `a := 1` if `b == c` else `0`; `a` is int
//! `INQL`/`RNQL`    | `a b c` | `a := 1` if `b != c` else `0`; `a` is int
//! `ILSS`/`RLSS`    | `a b c` | `a := 1` if `b < c` else `0`; `a` is int
//! `IGRT`/`RGRT`    | `a b c` | `a := 1` if `b > c` else `0`; `a` is int
//! `IADD`/`RADD`    | `a b c` | `a := b + c`
//! `ISUB`/`RSUB`    | `a b c` | `a := b - c`
//! `IMLT`/`RMLT`    | `a b c` | `a := b * c`
//! `IDIV`/`RDIV`    | `a b c` | `a := b / c` (int: truncating, real: IEEE)
//! `ITOR`           | `a b`   | `a := float(b)`
//! `RTOI`           | `a b`   | `a := int(b)`, truncating toward zero
//! `JUMP`           | `l`     | jump to instruction index `l`
//! `JMPZ`           | `l a`   | jump to `l` if the int value `a` is zero
//! `HALT`           |         | stop

mod error;
mod instruction;
mod interpreter;
mod program;


pub use self::error::*;
pub use self::instruction::*;
pub use self::interpreter::*;
pub use self::program::*;

pub type Int = i64;
pub type Float = f64;
