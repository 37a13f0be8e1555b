//! The semantic-directed translation from the CPL AST to Quad text.
//!
//! Expressions are lowered bottom-up; each node synthesizes a `(place,
//! type)` attribute where the place is either a leaf operand (name,
//! literal, named temporary) or the shared temporary of the node's type.
//! Arithmetic and comparisons write into the shared temporary of the
//! result type, so a value that must survive the emission of a sibling
//! sub-expression is first spilled into a fresh temporary.

use quad::ValueType;

use crate::ast::*;
use crate::codegen::{Codegen, Label, Operand, Temp};
use crate::error::{CompileError, ErrorKind};
use crate::symbol_table::{Symbol, SymbolTable};

/// Synthesized expression attribute.
struct Attr {
    place: Place,
    ty: ValueType,
}

enum Place {
    /// The value is a leaf operand, safe across further emission.
    Operand(Operand),
    /// The value sits in the shared temporary of the attribute's type and
    /// is clobbered by the next arithmetic of that type.
    Shared,
}

pub struct Compiler {
    symbols: SymbolTable,
    codegen: Codegen,
    shared_int: Temp,
    shared_float: Temp,
    loop_exit: Vec<Label>,
    errors: Vec<CompileError>,
}

type Semantic<T> = Result<T, ErrorKind>;

impl Compiler {
    pub fn new() -> Compiler {
        let mut codegen = Codegen::new();
        // The two shared temporaries exist before any user code is lowered.
        let shared_int = codegen.newtemp(ValueType::Int);
        let shared_float = codegen.newtemp(ValueType::Float);

        Compiler {
            symbols: SymbolTable::new(),
            codegen,
            shared_int,
            shared_float,
            loop_exit: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Translates a whole program. All semantic errors found anywhere in
    /// the program are returned together; no code text is produced if any
    /// were reported.
    pub fn run(mut self, program: &Program) -> Result<String, Vec<CompileError>> {
        self.declarations(&program.declarations);
        self.block(&program.body);
        self.codegen.halt();

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        self.codegen.backpatch();
        Ok(self.codegen.text())
    }

    fn shared(&self, ty: ValueType) -> &Temp {
        match ty {
            ValueType::Int => &self.shared_int,
            ValueType::Float => &self.shared_float,
        }
    }

    fn shared_operand(&self, ty: ValueType) -> Operand {
        Operand::Temp(self.shared(ty).clone())
    }

    fn declarations(&mut self, declarations: &[Declaration]) {
        for declaration in declarations {
            for name in &declaration.names {
                if let Err(kind) = self.symbols.insert(Symbol::new(name, declaration.ty)) {
                    self.errors
                        .push(CompileError::new(declaration.line, kind));
                }
            }
        }
    }

    /// A statement block owns a scope frame; it is popped on every exit
    /// path because statement errors are already contained per statement.
    fn block(&mut self, body: &[Stmt]) {
        self.symbols.push_scope();
        for stmt in body {
            self.stmt(stmt);
        }
        self.symbols.pop_scope();
    }

    /// Statement-granularity recovery: an error aborts the current
    /// statement, is recorded with its source line, and lowering continues
    /// with the next statement.
    fn stmt(&mut self, stmt: &Stmt) {
        if let Err(kind) = self.stmt_inner(stmt) {
            self.errors.push(CompileError::new(stmt.line(), kind));
        }
    }

    fn stmt_inner(&mut self, stmt: &Stmt) -> Semantic<()> {
        match stmt {
            Stmt::Assign { name, value, .. } => self.assignment(name, value),
            Stmt::Input { name, .. } => self.input(name),
            Stmt::Output { value, .. } => self.output(value),
            Stmt::If {
                cond,
                then,
                otherwise,
                ..
            } => self.if_stmt(cond, then, otherwise),
            Stmt::While { cond, body, .. } => self.while_stmt(cond, body),
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                ..
            } => self.switch(scrutinee, cases, default),
            Stmt::Break { .. } => self.break_stmt(),
            Stmt::Block { body, .. } => {
                self.block(body);
                Ok(())
            }
        }
    }

    fn assignment(&mut self, name: &str, value: &Expr) -> Semantic<()> {
        let var_ty = self.symbols.lookup(name)?.ty;

        let attr = self.expression(value)?;
        let mut value_op = self.place_operand(&attr, false);

        if attr.ty != var_ty {
            match var_ty {
                // Narrowing requires an explicit static_cast<int>.
                ValueType::Int => {
                    return Err(ErrorKind::TypeMismatch(format!(
                        "Cannot assign `{}` to variable `{}` of type `{}`",
                        attr.ty, name, var_ty
                    )));
                }
                ValueType::Float => {
                    value_op = self.cast_operand(value_op, ValueType::Float, false);
                }
            }
        }

        self.codegen
            .asn(var_ty, &Operand::Id(name.to_owned()), &value_op);
        self.symbols.mark_assigned(name);
        Ok(())
    }

    fn input(&mut self, name: &str) -> Semantic<()> {
        let var_ty = self.symbols.lookup(name)?.ty;
        self.codegen.inp(var_ty, &Operand::Id(name.to_owned()));
        self.symbols.mark_assigned(name);
        Ok(())
    }

    fn output(&mut self, value: &Expr) -> Semantic<()> {
        let attr = self.expression(value)?;
        let value_op = self.place_operand(&attr, false);
        self.codegen.prt(attr.ty, &value_op);
        Ok(())
    }

    fn if_stmt(&mut self, cond: &BoolExpr, then: &Stmt, otherwise: &Stmt) -> Semantic<()> {
        let l_after = self.codegen.newlabel();
        let l_else = self.codegen.newlabel();

        self.boolexpr(cond)?;
        let cond_op = self.shared_operand(ValueType::Int);
        self.codegen.jmpz(&l_else, &cond_op);

        self.stmt(then);
        self.codegen.jump(&l_after);

        self.codegen.bind(&l_else);
        self.stmt(otherwise);
        self.codegen.bind(&l_after);
        Ok(())
    }

    fn while_stmt(&mut self, cond: &BoolExpr, body: &Stmt) -> Semantic<()> {
        let l_top = self.codegen.newlabel();
        let l_exit = self.codegen.newlabel();

        self.codegen.bind(&l_top);
        self.boolexpr(cond)?;
        let cond_op = self.shared_operand(ValueType::Int);
        self.codegen.jmpz(&l_exit, &cond_op);

        self.loop_exit.push(l_exit.clone());
        self.stmt(body);
        self.loop_exit.pop();

        self.codegen.jump(&l_top);
        self.codegen.bind(&l_exit);
        Ok(())
    }

    /// Lowered as the right-associated chain
    /// `if (t == n1) S1 else if (t == n2) S2 else ... else Sd`
    /// over a fresh copy `t` of the scrutinee. There is no fall-through,
    /// and the switch does not push onto the loop-exit stack: a `break`
    /// inside a case targets the enclosing `while`.
    fn switch(&mut self, scrutinee: &Expr, cases: &[Case], default: &[Stmt]) -> Semantic<()> {
        let t = self.codegen.newtemp(ValueType::Int);
        let attr = self.expression(scrutinee)?;
        let value_op = self.place_operand(&attr, false);

        if attr.ty != ValueType::Int {
            return Err(ErrorKind::TypeMismatch(format!(
                "Expected switch expression to be of type `int`, got type `{}` instead",
                attr.ty
            )));
        }

        self.codegen
            .asn(ValueType::Int, &Operand::Temp(t.clone()), &value_op);
        self.switch_cases(&t, cases, default);
        Ok(())
    }

    fn switch_cases(&mut self, t: &Temp, cases: &[Case], default: &[Stmt]) {
        let (case, rest) = match cases.split_first() {
            Some(split) => split,
            None => {
                self.block(default);
                return;
            }
        };

        let l_after = self.codegen.newlabel();
        let l_else = self.codegen.newlabel();

        let shared = self.shared_operand(ValueType::Int);
        self.codegen.eql(
            ValueType::Int,
            &shared,
            &Operand::Temp(t.clone()),
            &Operand::Num(case.value.clone()),
        );
        self.codegen.jmpz(&l_else, &shared);

        self.block(&case.body);
        self.codegen.jump(&l_after);

        self.codegen.bind(&l_else);
        self.switch_cases(t, rest, default);
        self.codegen.bind(&l_after);
    }

    fn break_stmt(&mut self) -> Semantic<()> {
        match self.loop_exit.last() {
            Some(l_exit) => {
                let l_exit = l_exit.clone();
                self.codegen.jump(&l_exit);
                Ok(())
            }
            None => Err(ErrorKind::BreakOutsideLoop),
        }
    }

    /// Materializes the attribute's value as a leaf operand. With
    /// `protect`, a value living in a shared temporary is spilled into a
    /// fresh one so it survives subsequent emission.
    fn place_operand(&mut self, attr: &Attr, protect: bool) -> Operand {
        match &attr.place {
            Place::Operand(op) => op.clone(),
            Place::Shared => {
                let shared = self.shared_operand(attr.ty);
                if protect {
                    let fresh = self.codegen.newtemp(attr.ty);
                    let fresh_op = Operand::Temp(fresh);
                    self.codegen.asn(attr.ty, &fresh_op, &shared);
                    fresh_op
                } else {
                    shared
                }
            }
        }
    }

    /// Emits the conversion of `value` into `to`. A protected result gets
    /// a fresh temporary of the target type (the target of a cast is never
    /// re-typed in place: the VM fixes a name's type at its first write);
    /// otherwise the shared temporary of the target type is used.
    fn cast_operand(&mut self, value: Operand, to: ValueType, protect: bool) -> Operand {
        let dest = if protect {
            Operand::Temp(self.codegen.newtemp(to))
        } else {
            self.shared_operand(to)
        };
        self.codegen.cast(to, &dest, &value);
        dest
    }

    fn type_max(a: ValueType, b: ValueType) -> ValueType {
        if a == ValueType::Float || b == ValueType::Float {
            ValueType::Float
        } else {
            ValueType::Int
        }
    }

    fn expression(&mut self, expr: &Expr) -> Semantic<Attr> {
        match expr {
            Expr::Num(number) => Ok(Attr {
                place: Place::Operand(Operand::Num(number.clone())),
                ty: number.ty,
            }),
            Expr::Id(name) => {
                let symbol = self.symbols.lookup(name)?;
                if !symbol.assigned {
                    return Err(ErrorKind::UsedBeforeAssigned(name.clone()));
                }
                let ty = symbol.ty;
                Ok(Attr {
                    place: Place::Operand(Operand::Id(name.clone())),
                    ty,
                })
            }
            Expr::Cast { to, value } => self.cast_expr(*to, value),
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
        }
    }

    fn cast_expr(&mut self, to: ValueType, value: &Expr) -> Semantic<Attr> {
        let attr = self.expression(value)?;
        if attr.ty == to {
            // No conversion, only the static type changes.
            return Ok(Attr {
                place: attr.place,
                ty: to,
            });
        }

        let value_op = self.place_operand(&attr, false);
        self.cast_operand(value_op, to, false);
        Ok(Attr {
            place: Place::Shared,
            ty: to,
        })
    }

    /// Binary arithmetic: the right operand is emitted first and spilled
    /// out of the shared temporary, then the left operand is emitted, then
    /// the operation writes the shared temporary of the result type.
    fn binary(&mut self, op: ArithOp, lhs: &Expr, rhs: &Expr) -> Semantic<Attr> {
        let rhs_attr = self.expression(rhs)?;
        let mut rhs_op = self.place_operand(&rhs_attr, true);

        let lhs_attr = self.expression(lhs)?;
        let mut lhs_op = self.place_operand(&lhs_attr, false);

        let ty = Compiler::type_max(lhs_attr.ty, rhs_attr.ty);
        if lhs_attr.ty != rhs_attr.ty {
            if rhs_attr.ty != ty {
                rhs_op = self.cast_operand(rhs_op, ty, true);
            } else {
                lhs_op = self.cast_operand(lhs_op, ty, false);
            }
        }

        let dest = self.shared_operand(ty);
        match op {
            ArithOp::Add => self.codegen.add(ty, &dest, &lhs_op, &rhs_op),
            ArithOp::Sub => self.codegen.sub(ty, &dest, &lhs_op, &rhs_op),
            ArithOp::Mul => self.codegen.mlt(ty, &dest, &lhs_op, &rhs_op),
            ArithOp::Div => self.codegen.div(ty, &dest, &lhs_op, &rhs_op),
        }

        Ok(Attr {
            place: Place::Shared,
            ty,
        })
    }

    /// Lowers a boolean expression; its 0/1 truth value is left in the
    /// shared int temporary. Sub-expressions leave canonical 0/1 there,
    /// which the `&&`/`||`/`!` encodings rely on.
    fn boolexpr(&mut self, expr: &BoolExpr) -> Semantic<()> {
        match expr {
            BoolExpr::Or(lhs, rhs) => {
                self.boolexpr(lhs)?;
                let saved = self.save_bool();
                self.boolexpr(rhs)?;
                // a || b  ==  a + b > 0
                let shared = self.shared_operand(ValueType::Int);
                self.codegen.add(ValueType::Int, &shared, &saved, &shared);
                self.codegen
                    .grt(ValueType::Int, &shared, &shared, &Operand::int_literal(0));
                Ok(())
            }
            BoolExpr::And(lhs, rhs) => {
                self.boolexpr(lhs)?;
                let saved = self.save_bool();
                self.boolexpr(rhs)?;
                // a && b  ==  a + b == 2
                let shared = self.shared_operand(ValueType::Int);
                self.codegen.add(ValueType::Int, &shared, &saved, &shared);
                self.codegen
                    .eql(ValueType::Int, &shared, &shared, &Operand::int_literal(2));
                Ok(())
            }
            BoolExpr::Not(inner) => {
                self.boolexpr(inner)?;
                self.emit_not();
                Ok(())
            }
            BoolExpr::Relop { op, lhs, rhs } => match op {
                // >= and <= have no opcode of their own.
                RelOp::Geq => {
                    self.relop(RelOp::Lss, lhs, rhs)?;
                    self.emit_not();
                    Ok(())
                }
                RelOp::Leq => {
                    self.relop(RelOp::Grt, lhs, rhs)?;
                    self.emit_not();
                    Ok(())
                }
                _ => self.relop(*op, lhs, rhs),
            },
        }
    }

    /// Spills the current truth value out of the shared int temporary.
    fn save_bool(&mut self) -> Operand {
        let fresh = self.codegen.newtemp(ValueType::Int);
        let fresh_op = Operand::Temp(fresh);
        let shared = self.shared_operand(ValueType::Int);
        self.codegen.asn(ValueType::Int, &fresh_op, &shared);
        fresh_op
    }

    /// `x := (x == 0)` flips a canonical 0/1 in the shared int temporary.
    fn emit_not(&mut self) {
        let shared = self.shared_operand(ValueType::Int);
        self.codegen
            .eql(ValueType::Int, &shared, &shared, &Operand::int_literal(0));
    }

    fn relop(&mut self, op: RelOp, lhs: &Expr, rhs: &Expr) -> Semantic<()> {
        let lhs_attr = self.expression(lhs)?;
        let mut lhs_op = self.place_operand(&lhs_attr, true);

        let rhs_attr = self.expression(rhs)?;
        let mut rhs_op = self.place_operand(&rhs_attr, false);

        let ty = Compiler::type_max(lhs_attr.ty, rhs_attr.ty);
        if lhs_attr.ty != rhs_attr.ty {
            if lhs_attr.ty != ty {
                lhs_op = self.cast_operand(lhs_op, ty, true);
            } else {
                rhs_op = self.cast_operand(rhs_op, ty, false);
            }
        }

        // The comparison result is an int whatever the operand type.
        let dest = self.shared_operand(ValueType::Int);
        match op {
            RelOp::Eql => self.codegen.eql(ty, &dest, &lhs_op, &rhs_op),
            RelOp::Nql => self.codegen.nql(ty, &dest, &lhs_op, &rhs_op),
            RelOp::Lss => self.codegen.lss(ty, &dest, &lhs_op, &rhs_op),
            RelOp::Grt => self.codegen.grt(ty, &dest, &lhs_op, &rhs_op),
            RelOp::Leq | RelOp::Geq => unreachable!(),
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Compiler {
        Compiler::new()
    }
}
