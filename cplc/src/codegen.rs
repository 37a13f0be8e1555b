//! Quad emission: an append-only list of textual instructions, temporary
//! and label allocation, and the label backpatching pass.

use std::collections::HashMap;
use std::fmt;

use quad::{Opcode, ValueType};

use crate::ast::Number;

/// A named temporary (`t0`, `t1`, ...) with its declared type.
#[derive(Clone, PartialEq, Debug)]
pub struct Temp {
    pub name: String,
    pub ty: ValueType,
}

/// A forward-referenceable label (`l0`, `l1`, ...). Emission writes the
/// name; backpatching substitutes the bound instruction index.
#[derive(Clone, PartialEq, Debug)]
pub struct Label(pub String);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A leaf operand in emitted code.
#[derive(Clone, PartialEq, Debug)]
pub enum Operand {
    Id(String),
    Temp(Temp),
    Num(Number),
}

impl Operand {
    pub fn int_literal(value: i64) -> Operand {
        Operand::Num(Number {
            text: value.to_string(),
            ty: ValueType::Int,
        })
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Id(name) => f.write_str(name),
            Operand::Temp(temp) => f.write_str(&temp.name),
            Operand::Num(number) => f.write_str(&number.text),
        }
    }
}

fn typed(ty: ValueType, int_op: Opcode, float_op: Opcode) -> Opcode {
    match ty {
        ValueType::Int => int_op,
        ValueType::Float => float_op,
    }
}

pub struct Codegen {
    code: Vec<String>,
    labels: u32,
    bindings: HashMap<String, u32>,
    temps: u32,
}

impl Codegen {
    pub fn new() -> Codegen {
        Codegen {
            code: Vec::new(),
            labels: 0,
            bindings: HashMap::new(),
            temps: 0,
        }
    }

    pub fn newtemp(&mut self, ty: ValueType) -> Temp {
        let name = format!("t{}", self.temps);
        self.temps += 1;
        Temp { name, ty }
    }

    pub fn newlabel(&mut self) -> Label {
        let label = Label(format!("l{}", self.labels));
        self.labels += 1;
        label
    }

    /// Binds the label to the next instruction to be emitted. Each label
    /// is bound exactly once.
    pub fn bind(&mut self, label: &Label) {
        let index = self.code.len() as u32 + 1;
        let previous = self.bindings.insert(label.0.clone(), index);
        debug_assert!(previous.is_none());
    }

    /// Rewrites every label-name token to its bound 1-based instruction
    /// index. Matching whole tokens only keeps `l1` from corrupting `l10`;
    /// a second pass finds no label tokens left, so the pass is idempotent.
    pub fn backpatch(&mut self) {
        let bindings = &self.bindings;
        for line in &mut self.code {
            if line.split_whitespace().any(|tok| bindings.contains_key(tok)) {
                *line = line
                    .split_whitespace()
                    .map(|tok| match bindings.get(tok) {
                        Some(index) => index.to_string(),
                        None => tok.to_owned(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
            }
        }
    }

    pub fn code(&self) -> &[String] {
        &self.code
    }

    pub fn text(&self) -> String {
        self.code.join("\n")
    }

    /// Human-readable dump with 1-based instruction numbers.
    pub fn listing(&self) -> String {
        self.code
            .iter()
            .enumerate()
            .map(|(index, line)| format!("{}: {}", index + 1, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, op: Opcode, args: &[&dyn fmt::Display]) {
        let mut line = op.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.to_string());
        }
        self.code.push(line);
    }

    pub fn asn(&mut self, ty: ValueType, a: &Operand, b: &Operand) {
        self.push(typed(ty, Opcode::IASN, Opcode::RASN), &[a, b]);
    }

    pub fn prt(&mut self, ty: ValueType, b: &Operand) {
        self.push(typed(ty, Opcode::IPRT, Opcode::RPRT), &[b]);
    }

    pub fn inp(&mut self, ty: ValueType, a: &Operand) {
        self.push(typed(ty, Opcode::IINP, Opcode::RINP), &[a]);
    }

    pub fn eql(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::IEQL, Opcode::REQL), &[a, b, c]);
    }

    pub fn nql(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::INQL, Opcode::RNQL), &[a, b, c]);
    }

    pub fn lss(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::ILSS, Opcode::RLSS), &[a, b, c]);
    }

    pub fn grt(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::IGRT, Opcode::RGRT), &[a, b, c]);
    }

    pub fn add(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::IADD, Opcode::RADD), &[a, b, c]);
    }

    pub fn sub(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::ISUB, Opcode::RSUB), &[a, b, c]);
    }

    pub fn mlt(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::IMLT, Opcode::RMLT), &[a, b, c]);
    }

    pub fn div(&mut self, ty: ValueType, a: &Operand, b: &Operand, c: &Operand) {
        self.push(typed(ty, Opcode::IDIV, Opcode::RDIV), &[a, b, c]);
    }

    /// Conversion into `to`: `ITOR` widens an int, `RTOI` truncates a
    /// float toward zero.
    pub fn cast(&mut self, to: ValueType, a: &Operand, b: &Operand) {
        self.push(typed(to, Opcode::RTOI, Opcode::ITOR), &[a, b]);
    }

    pub fn jump(&mut self, l: &Label) {
        self.push(Opcode::JUMP, &[l]);
    }

    pub fn jmpz(&mut self, l: &Label, a: &Operand) {
        self.push(Opcode::JMPZ, &[l, a]);
    }

    pub fn halt(&mut self) {
        self.push(Opcode::HALT, &[]);
    }
}

impl Default for Codegen {
    fn default() -> Codegen {
        Codegen::new()
    }
}
