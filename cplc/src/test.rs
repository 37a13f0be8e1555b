use std::io::Cursor;

use quad::ValueType;

use crate::ast::*;
use crate::codegen::Codegen;
use crate::error::ErrorKind;
use crate::symbol_table::{Symbol, SymbolTable};
use crate::{compile, parse, CompileError, Error};

fn compile_lines(src: &str) -> Vec<String> {
    compile(src).unwrap().lines().map(String::from).collect()
}

fn compile_errors(src: &str) -> Vec<CompileError> {
    match compile(src).unwrap_err() {
        Error::Semantic(errors) => errors,
        Error::Parse(err) => panic!("expected semantic errors, got parse error: {}", err),
    }
}

/// Compiles, loads and runs a program, returning what it printed.
fn run_cpl(src: &str, input: &str) -> String {
    let code = compile(src).unwrap();
    let program = quad::Program::load(&code).unwrap();
    let mut output = Vec::new();
    quad::Interpreter::new(&program, Cursor::new(input.as_bytes()), &mut output)
        .run()
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn parse_simple_program() {
    let ast = parse("a: int;\n{ a = 1; }").unwrap();

    assert_eq!(
        ast,
        Program {
            declarations: vec![Declaration {
                names: vec!["a".to_owned()],
                ty: ValueType::Int,
                line: 1,
            }],
            body: vec![Stmt::Assign {
                name: "a".to_owned(),
                value: Expr::Num(Number {
                    text: "1".to_owned(),
                    ty: ValueType::Int,
                }),
                line: 2,
            }],
        }
    );
}

#[test]
fn parse_addition_is_left_associative() {
    let ast = parse("a: int;\n{ a = 1 - 2 + 3; }").unwrap();

    let num = |text: &str| {
        Box::new(Expr::Num(Number {
            text: text.to_owned(),
            ty: ValueType::Int,
        }))
    };
    let expected = Expr::Binary {
        op: ArithOp::Add,
        lhs: Box::new(Expr::Binary {
            op: ArithOp::Sub,
            lhs: num("1"),
            rhs: num("2"),
        }),
        rhs: num("3"),
    };

    match &ast.body[0] {
        Stmt::Assign { value, .. } => assert_eq!(*value, expected),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn parse_multiplication_binds_tighter() {
    let ast = parse("a: int;\n{ a = 2 + 3 * 4; }").unwrap();

    match &ast.body[0] {
        Stmt::Assign {
            value: Expr::Binary { op, rhs, .. },
            ..
        } => {
            assert_eq!(*op, ArithOp::Add);
            assert!(matches!(**rhs, Expr::Binary { op: ArithOp::Mul, .. }));
        }
        other => panic!("expected assignment of a sum, got {:?}", other),
    }
}

#[test]
fn parse_rejects_reserved_word_as_identifier() {
    assert!(parse("int: int;\n{ }").is_err());
    assert!(parse("{ while = 5; }").is_err());
}

#[test]
fn parse_rejects_unterminated_comment() {
    assert!(parse("a: int; /* no end\n{ }").is_err());
}

#[test]
fn parse_allows_comments_between_statements() {
    let ast = parse("a: int;\n{\n/* set it\n   up */\na = 1; /* done */\n}").unwrap();
    assert_eq!(ast.body.len(), 1);
}

#[test]
fn symbol_table_scoping() {
    let mut table = SymbolTable::new();
    table.insert(Symbol::new("a", ValueType::Int)).unwrap();

    // Redeclaration in the same scope is rejected.
    assert_eq!(
        table.insert(Symbol::new("a", ValueType::Float)).unwrap_err(),
        ErrorKind::AlreadyDeclared("a".to_owned())
    );

    // An inner scope may shadow, and lookup finds the innermost symbol.
    table.push_scope();
    table.insert(Symbol::new("a", ValueType::Float)).unwrap();
    assert_eq!(table.lookup("a").unwrap().ty, ValueType::Float);

    table.pop_scope();
    assert_eq!(table.lookup("a").unwrap().ty, ValueType::Int);

    assert_eq!(
        table.lookup("missing").unwrap_err(),
        ErrorKind::NotFound("missing".to_owned())
    );
}

#[test]
fn symbol_table_mark_assigned() {
    let mut table = SymbolTable::new();
    table.insert(Symbol::new("a", ValueType::Int)).unwrap();
    assert!(!table.lookup("a").unwrap().assigned);

    table.mark_assigned("a");
    assert!(table.lookup("a").unwrap().assigned);

    // Idempotent.
    table.mark_assigned("a");
    assert!(table.lookup("a").unwrap().assigned);
}

#[test]
fn backpatch_replaces_whole_tokens_only() {
    let mut cg = Codegen::new();
    let labels: Vec<_> = (0..11).map(|_| cg.newlabel()).collect();
    assert_eq!(labels[10].0, "l10");

    cg.jump(&labels[1]);
    cg.jump(&labels[10]);
    cg.bind(&labels[1]);
    cg.halt();
    cg.bind(&labels[10]);

    cg.backpatch();
    assert_eq!(cg.code(), ["JUMP 3", "JUMP 4", "HALT"]);
}

#[test]
fn backpatch_is_idempotent() {
    let mut cg = Codegen::new();
    let l = cg.newlabel();
    cg.jump(&l);
    cg.bind(&l);
    cg.halt();

    cg.backpatch();
    let once = cg.code().to_vec();
    cg.backpatch();
    assert_eq!(cg.code(), &once[..]);
}

#[test]
fn listing_is_one_based() {
    let mut cg = Codegen::new();
    cg.halt();
    assert_eq!(cg.listing(), "1: HALT");
}

#[test]
fn codegen_arithmetic_spills_the_right_operand() {
    let code = compile_lines("a: int;\n{\n    a = 2 + 3 * 4;\n    output(a);\n}");
    assert_eq!(
        code,
        [
            "IMLT t0 3 4",
            "IASN t2 t0",
            "IADD t0 2 t2",
            "IASN a t0",
            "IPRT a",
            "HALT",
        ]
    );
}

#[test]
fn codegen_widens_on_assignment_to_float() {
    let code = compile_lines("x: float;\ny: int;\n{\n    y = 3;\n    x = y / 2;\n    output(x);\n}");
    assert_eq!(
        code,
        [
            "IASN y 3",
            "IDIV t0 y 2",
            "ITOR t1 t0",
            "RASN x t1",
            "RPRT x",
            "HALT",
        ]
    );
}

#[test]
fn codegen_explicit_narrowing_cast() {
    let code = compile_lines("x: int;\n{\n    x = static_cast<int>(7.9);\n    output(x);\n}");
    assert_eq!(code, ["RTOI t0 7.9", "IASN x t0", "IPRT x", "HALT"]);
}

#[test]
fn codegen_cast_to_same_type_emits_nothing() {
    let code = compile_lines("x: int;\n{\n    x = static_cast<int>(3);\n}");
    assert_eq!(code, ["IASN x 3", "HALT"]);
}

#[test]
fn codegen_promotes_int_operand_to_float() {
    let code = compile_lines("x: float;\n{\n    x = 1 + 2.5;\n    output(x);\n}");
    assert_eq!(
        code,
        ["ITOR t1 1", "RADD t1 t1 2.5", "RASN x t1", "RPRT x", "HALT"]
    );
}

#[test]
fn codegen_promotes_spilled_operand_into_fresh_temp() {
    let code = compile_lines("x: float;\n{\n    x = 2.5 + (1 + 1);\n    output(x);\n}");
    assert_eq!(
        code,
        [
            "IADD t0 1 1",
            "IASN t2 t0",
            "ITOR t3 t2",
            "RADD t1 2.5 t3",
            "RASN x t1",
            "RPRT x",
            "HALT",
        ]
    );
}

#[test]
fn codegen_while_with_break() {
    let src = "i: int;\n\
               {\n\
                   i = 0;\n\
                   while (i < 5) {\n\
                       if (i == 3)\n\
                           break;\n\
                       else\n\
                           output(i);\n\
                       i = i + 1;\n\
                   }\n\
               }";
    assert_eq!(
        compile_lines(src),
        [
            "IASN i 0",
            "ILSS t0 i 5",
            "JMPZ 12 t0",
            "IEQL t0 i 3",
            "JMPZ 8 t0",
            "JUMP 12",
            "JUMP 9",
            "IPRT i",
            "IADD t0 i 1",
            "IASN i t0",
            "JUMP 2",
            "HALT",
        ]
    );
}

#[test]
fn codegen_switch_has_no_fall_through() {
    let src = "x: int;\n\
               {\n\
                   input(x);\n\
                   switch (x) {\n\
                       case 1: output(10);\n\
                       case 2: output(20);\n\
                       default: output(99);\n\
                   }\n\
               }";
    assert_eq!(
        compile_lines(src),
        [
            "IINP x",
            "IASN t2 x",
            "IEQL t0 t2 1",
            "JMPZ 7 t0",
            "IPRT 10",
            "JUMP 12",
            "IEQL t0 t2 2",
            "JMPZ 11 t0",
            "IPRT 20",
            "JUMP 12",
            "IPRT 99",
            "HALT",
        ]
    );
}

#[test]
fn codegen_or_adds_and_tests_positive() {
    let src = "a: int;\n\
               {\n\
                   a = 1;\n\
                   if (a == 1 || a > 2)\n\
                       output(1);\n\
                   else\n\
                       output(0);\n\
               }";
    assert_eq!(
        compile_lines(src),
        [
            "IASN a 1",
            "IEQL t0 a 1",
            "IASN t2 t0",
            "IGRT t0 a 2",
            "IADD t0 t2 t0",
            "IGRT t0 t0 0",
            "JMPZ 10 t0",
            "IPRT 1",
            "JUMP 11",
            "IPRT 0",
            "HALT",
        ]
    );
}

#[test]
fn codegen_and_not_and_greater_equal() {
    let src = "a: int;\n\
               {\n\
                   a = 5;\n\
                   if (a >= 2 && !(a == 3))\n\
                       output(1);\n\
                   else\n\
                       output(0);\n\
               }";
    assert_eq!(
        compile_lines(src),
        [
            "IASN a 5",
            "ILSS t0 a 2",
            "IEQL t0 t0 0",
            "IASN t2 t0",
            "IEQL t0 a 3",
            "IEQL t0 t0 0",
            "IADD t0 t2 t0",
            "IEQL t0 t0 2",
            "JMPZ 12 t0",
            "IPRT 1",
            "JUMP 13",
            "IPRT 0",
            "HALT",
        ]
    );
}

#[test]
fn narrowing_assignment_is_rejected() {
    let errors = compile_errors("x: int;\ny: float;\n{\n    y = 1.5;\n    x = y;\n}");
    assert_eq!(
        errors,
        [CompileError::new(
            5,
            ErrorKind::TypeMismatch(
                "Cannot assign `float` to variable `x` of type `int`".to_owned()
            )
        )]
    );
}

#[test]
fn break_outside_loop_is_rejected() {
    let errors = compile_errors("{\n    break;\n}");
    assert_eq!(errors, [CompileError::new(2, ErrorKind::BreakOutsideLoop)]);
}

#[test]
fn assignment_to_undeclared_name_is_rejected() {
    let errors = compile_errors("{ b = 1; }");
    assert_eq!(
        errors,
        [CompileError::new(1, ErrorKind::NotFound("b".to_owned()))]
    );
}

#[test]
fn use_before_assignment_is_rejected() {
    let errors = compile_errors("a, b: int;\n{\n    a = b;\n}");
    assert_eq!(
        errors,
        [CompileError::new(
            3,
            ErrorKind::UsedBeforeAssigned("b".to_owned())
        )]
    );
}

#[test]
fn duplicate_declaration_is_rejected() {
    let errors = compile_errors("a: int;\na: float;\n{ }");
    assert_eq!(
        errors,
        [CompileError::new(
            2,
            ErrorKind::AlreadyDeclared("a".to_owned())
        )]
    );
}

#[test]
fn switch_over_float_is_rejected() {
    let errors =
        compile_errors("x: float;\n{\n    x = 1.0;\n    switch (x) { default: output(0); }\n}");
    assert_eq!(
        errors,
        [CompileError::new(
            4,
            ErrorKind::TypeMismatch(
                "Expected switch expression to be of type `int`, got type `float` instead"
                    .to_owned()
            )
        )]
    );
}

#[test]
fn several_errors_are_reported_per_run() {
    let errors = compile_errors("{\n    b = 1;\n    c = 2;\n}");
    assert_eq!(
        errors,
        [
            CompileError::new(2, ErrorKind::NotFound("b".to_owned())),
            CompileError::new(3, ErrorKind::NotFound("c".to_owned())),
        ]
    );
}

#[test]
fn runs_arithmetic_and_print() {
    let src = "a: int;\n{\n    a = 2 + 3 * 4;\n    output(a);\n}";
    assert_eq!(run_cpl(src, ""), "14\n");
}

#[test]
fn runs_int_division_then_widens() {
    let src = "x: float;\ny: int;\n{\n    y = 3;\n    x = y / 2;\n    output(x);\n}";
    assert_eq!(run_cpl(src, ""), "1.0\n");
}

#[test]
fn runs_explicit_cast_truncating() {
    let src = "x: int;\n{\n    x = static_cast<int>(7.9);\n    output(x);\n}";
    assert_eq!(run_cpl(src, ""), "7\n");
}

#[test]
fn runs_float_promotion() {
    let src = "x: float;\n{\n    x = 2.5 + (1 + 1);\n    output(x);\n}";
    assert_eq!(run_cpl(src, ""), "4.5\n");
}

#[test]
fn runs_loop_with_break() {
    let src = "i: int;\n\
               {\n\
                   i = 0;\n\
                   while (i < 5) {\n\
                       if (i == 3)\n\
                           break;\n\
                       else\n\
                           output(i);\n\
                       i = i + 1;\n\
                   }\n\
               }";
    assert_eq!(run_cpl(src, ""), "0\n1\n2\n");
}

#[test]
fn runs_switch_without_fall_through() {
    let src = "x: int;\n\
               {\n\
                   input(x);\n\
                   switch (x) {\n\
                       case 1: output(10);\n\
                       case 2: output(20);\n\
                       default: output(99);\n\
                   }\n\
               }";
    assert_eq!(run_cpl(src, "2\n"), "x (int)? 20\n");
    assert_eq!(run_cpl(src, "7\n"), "x (int)? 99\n");
}

#[test]
fn break_in_switch_exits_the_enclosing_while() {
    let src = "i: int;\n\
               {\n\
                   i = 0;\n\
                   while (i < 3) {\n\
                       switch (i) {\n\
                           case 1: break;\n\
                           default: output(i);\n\
                       }\n\
                       i = i + 1;\n\
                   }\n\
               }";
    assert_eq!(run_cpl(src, ""), "0\n");
}

#[test]
fn runs_less_equal_as_not_greater() {
    let src = "i: int;\n\
               {\n\
                   i = 0;\n\
                   while (i <= 2) {\n\
                       output(i);\n\
                       i = i + 1;\n\
                   }\n\
               }";
    assert_eq!(run_cpl(src, ""), "0\n1\n2\n");
}

#[test]
fn runs_float_comparison_with_promotion() {
    let src = "x: float;\n\
               {\n\
                   input(x);\n\
                   if (x > 1)\n\
                       output(1);\n\
                   else\n\
                       output(0);\n\
               }";
    assert_eq!(run_cpl(src, "1.5\n"), "x (float)? 1\n");
    assert_eq!(run_cpl(src, "0.5\n"), "x (float)? 0\n");
}
