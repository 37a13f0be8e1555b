use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::{
    ErrorKind, Float, Instruction, Int, Opcode, Operand, Program, QuadError, Value, ValueType,
};

#[derive(Clone, Debug)]
struct Entry {
    declared_at: u32,
    value: Value,
}

/// The flat name → value environment. A name is declared by the first
/// write, which fixes its type; later reads and writes must agree.
#[derive(Default, Debug)]
struct Namespace {
    entries: HashMap<String, Entry>,
}

impl Namespace {
    fn get(&self, lineno: u32, expected: ValueType, name: &str) -> Result<Value, QuadError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| QuadError::new(lineno, ErrorKind::UndefinedVariable(name.to_owned())))?;
        self.check(lineno, expected, name, entry)?;
        Ok(entry.value)
    }

    fn set(&mut self, lineno: u32, name: &str, value: Value) -> Result<(), QuadError> {
        match self.entries.get_mut(name) {
            Some(entry) => {
                let found = entry.value.value_type();
                if found != value.value_type() {
                    return Err(QuadError::new(
                        lineno,
                        ErrorKind::VariableTypeMismatch {
                            name: name.to_owned(),
                            declared_at: entry.declared_at,
                            expected: value.value_type(),
                            found,
                        },
                    ));
                }
                entry.value = value;
            }
            None => {
                self.entries.insert(
                    name.to_owned(),
                    Entry {
                        declared_at: lineno,
                        value,
                    },
                );
            }
        }
        Ok(())
    }

    fn check(
        &self,
        lineno: u32,
        expected: ValueType,
        name: &str,
        entry: &Entry,
    ) -> Result<(), QuadError> {
        let found = entry.value.value_type();
        if found != expected {
            return Err(QuadError::new(
                lineno,
                ErrorKind::VariableTypeMismatch {
                    name: name.to_owned(),
                    declared_at: entry.declared_at,
                    expected,
                    found,
                },
            ));
        }
        Ok(())
    }
}

/// Executes a loaded [`Program`] with a fetch-execute loop over a 1-based
/// program counter. Input and output are arbitrary streams so that
/// execution can be driven from tests; trace output goes to stderr.
pub struct Interpreter<'a, R: BufRead, W: Write> {
    program: &'a Program,
    input: R,
    output: W,
    trace: bool,
    pc: usize,
    ns: Namespace,
}

impl<'a, R: BufRead, W: Write> Interpreter<'a, R, W> {
    pub fn new(program: &'a Program, input: R, output: W) -> Interpreter<'a, R, W> {
        Interpreter {
            program,
            input,
            output,
            trace: false,
            pc: 1,
            ns: Namespace::default(),
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Interpreter<'a, R, W> {
        self.trace = trace;
        self
    }

    /// Runs until `HALT` or the first runtime error.
    pub fn run(&mut self) -> Result<(), QuadError> {
        let program = self.program;
        loop {
            let inst = &program.code[self.pc - 1];
            if self.trace {
                eprintln!("#{} {}", self.pc, inst.text);
            }
            self.pc += 1;

            match inst.op {
                Opcode::IASN => self.asn(ValueType::Int, inst)?,
                Opcode::RASN => self.asn(ValueType::Float, inst)?,
                Opcode::IPRT => self.prt(ValueType::Int, inst)?,
                Opcode::RPRT => self.prt(ValueType::Float, inst)?,
                Opcode::IINP => self.inp(ValueType::Int, inst)?,
                Opcode::RINP => self.inp(ValueType::Float, inst)?,
                Opcode::IEQL => self.compare(ValueType::Int, inst, |o| o == Some(Ordering::Equal))?,
                Opcode::REQL => {
                    self.compare(ValueType::Float, inst, |o| o == Some(Ordering::Equal))?
                }
                Opcode::INQL => self.compare(ValueType::Int, inst, |o| o != Some(Ordering::Equal))?,
                Opcode::RNQL => {
                    self.compare(ValueType::Float, inst, |o| o != Some(Ordering::Equal))?
                }
                Opcode::ILSS => self.compare(ValueType::Int, inst, |o| o == Some(Ordering::Less))?,
                Opcode::RLSS => {
                    self.compare(ValueType::Float, inst, |o| o == Some(Ordering::Less))?
                }
                Opcode::IGRT => {
                    self.compare(ValueType::Int, inst, |o| o == Some(Ordering::Greater))?
                }
                Opcode::RGRT => {
                    self.compare(ValueType::Float, inst, |o| o == Some(Ordering::Greater))?
                }
                Opcode::IADD => self.int_arith(inst, |b, c| Some(b.wrapping_add(c)))?,
                Opcode::ISUB => self.int_arith(inst, |b, c| Some(b.wrapping_sub(c)))?,
                Opcode::IMLT => self.int_arith(inst, |b, c| Some(b.wrapping_mul(c)))?,
                Opcode::IDIV => self.int_arith(inst, |b, c| {
                    if c == 0 {
                        None
                    } else {
                        Some(b.wrapping_div(c))
                    }
                })?,
                Opcode::RADD => self.float_arith(inst, |b, c| b + c)?,
                Opcode::RSUB => self.float_arith(inst, |b, c| b - c)?,
                Opcode::RMLT => self.float_arith(inst, |b, c| b * c)?,
                Opcode::RDIV => self.float_arith(inst, |b, c| b / c)?,
                Opcode::ITOR => {
                    let value = self.int_value(inst, 1)?;
                    self.assign(inst, Value::Float(value as Float))?;
                }
                Opcode::RTOI => {
                    let value = self.float_value(inst, 1)?;
                    self.assign(inst, Value::Int(value as Int))?;
                }
                Opcode::JUMP => {
                    self.pc = self.jump_target(inst, 0)?;
                }
                Opcode::JMPZ => {
                    let target = self.jump_target(inst, 0)?;
                    if self.int_value(inst, 1)? == 0 {
                        self.pc = target;
                    }
                }
                Opcode::HALT => break,
            }
        }

        Ok(())
    }

    fn value(&self, expected: ValueType, inst: &Instruction, index: usize) -> Result<Value, QuadError> {
        match &inst.operands[index] {
            Operand::Id(name) => self.ns.get(inst.lineno, expected, name),
            Operand::Int(value) if expected == ValueType::Int => Ok(Value::Int(*value)),
            Operand::Float(value) if expected == ValueType::Float => Ok(Value::Float(*value)),
            Operand::Int(_) => Err(self.operand_mismatch(inst, expected, ValueType::Int)),
            Operand::Float(_) => Err(self.operand_mismatch(inst, expected, ValueType::Float)),
        }
    }

    fn operand_mismatch(
        &self,
        inst: &Instruction,
        expected: ValueType,
        found: ValueType,
    ) -> QuadError {
        QuadError::new(inst.lineno, ErrorKind::OperandTypeMismatch { expected, found })
    }

    fn int_value(&self, inst: &Instruction, index: usize) -> Result<Int, QuadError> {
        match self.value(ValueType::Int, inst, index)? {
            Value::Int(value) => Ok(value),
            Value::Float(_) => unreachable!(),
        }
    }

    fn float_value(&self, inst: &Instruction, index: usize) -> Result<Float, QuadError> {
        match self.value(ValueType::Float, inst, index)? {
            Value::Float(value) => Ok(value),
            Value::Int(_) => unreachable!(),
        }
    }

    /// Writes `value` into the destination name in operand 0.
    fn assign(&mut self, inst: &Instruction, value: Value) -> Result<(), QuadError> {
        match &inst.operands[0] {
            Operand::Id(name) => self.ns.set(inst.lineno, name, value),
            other => Err(QuadError::new(
                inst.lineno,
                ErrorKind::InvalidOperand(other.to_string()),
            )),
        }
    }

    fn asn(&mut self, ty: ValueType, inst: &Instruction) -> Result<(), QuadError> {
        let value = self.value(ty, inst, 1)?;
        self.assign(inst, value)
    }

    fn prt(&mut self, ty: ValueType, inst: &Instruction) -> Result<(), QuadError> {
        let value = self.value(ty, inst, 0)?;
        writeln!(self.output, "{}", value)
            .map_err(|err| QuadError::new(inst.lineno, ErrorKind::Io(err.to_string())))
    }

    fn inp(&mut self, ty: ValueType, inst: &Instruction) -> Result<(), QuadError> {
        let name = match &inst.operands[0] {
            Operand::Id(name) => name.clone(),
            other => {
                return Err(QuadError::new(
                    inst.lineno,
                    ErrorKind::InvalidOperand(other.to_string()),
                ))
            }
        };
        let io_err = |err: std::io::Error| {
            QuadError::new(inst.lineno, ErrorKind::Io(err.to_string()))
        };

        let value = loop {
            write!(self.output, "{} ({})? ", name, ty).map_err(io_err)?;
            self.output.flush().map_err(io_err)?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(io_err)?;
            if read == 0 {
                return Err(QuadError::new(
                    inst.lineno,
                    ErrorKind::Io("unexpected end of input".to_owned()),
                ));
            }

            let token = line.trim();
            let parsed = match ty {
                ValueType::Int => token.parse().map(Value::Int).ok(),
                ValueType::Float => token.parse().map(Value::Float).ok(),
            };
            match parsed {
                Some(value) => break value,
                None => writeln!(self.output, "Invalid input!").map_err(io_err)?,
            }
        };

        self.ns.set(inst.lineno, &name, value)
    }

    /// Comparisons always produce an int 0/1, regardless of operand type.
    /// Float comparisons follow IEEE: NaN is unordered (`None`).
    fn compare<F>(&mut self, ty: ValueType, inst: &Instruction, cond: F) -> Result<(), QuadError>
    where
        F: Fn(Option<Ordering>) -> bool,
    {
        let ordering = match ty {
            ValueType::Int => {
                let b = self.int_value(inst, 1)?;
                let c = self.int_value(inst, 2)?;
                Some(b.cmp(&c))
            }
            ValueType::Float => {
                let b = self.float_value(inst, 1)?;
                let c = self.float_value(inst, 2)?;
                b.partial_cmp(&c)
            }
        };
        let result = if cond(ordering) { 1 } else { 0 };
        self.assign(inst, Value::Int(result))
    }

    fn int_arith<F>(&mut self, inst: &Instruction, op: F) -> Result<(), QuadError>
    where
        F: Fn(Int, Int) -> Option<Int>,
    {
        let b = self.int_value(inst, 1)?;
        let c = self.int_value(inst, 2)?;
        let result = op(b, c)
            .ok_or_else(|| QuadError::new(inst.lineno, ErrorKind::DivisionByZero))?;
        self.assign(inst, Value::Int(result))
    }

    fn float_arith<F>(&mut self, inst: &Instruction, op: F) -> Result<(), QuadError>
    where
        F: Fn(Float, Float) -> Float,
    {
        let b = self.float_value(inst, 1)?;
        let c = self.float_value(inst, 2)?;
        self.assign(inst, Value::Float(op(b, c)))
    }

    fn jump_target(&self, inst: &Instruction, index: usize) -> Result<usize, QuadError> {
        match &inst.operands[index] {
            Operand::Int(target) if *target >= 1 && *target <= self.program.len() as Int => {
                Ok(*target as usize)
            }
            other => Err(QuadError::new(
                inst.lineno,
                ErrorKind::InvalidJumpTarget(other.to_string()),
            )),
        }
    }
}
