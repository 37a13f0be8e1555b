use matches::debug_assert_matches;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use quad::ValueType;

use crate::ast::*;

#[derive(Parser)]
#[grammar = "cpl.pest"]
pub struct CPLParser;

pub type ParseError = pest::error::Error<Rule>;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parses CPL source text into the AST. Lexical and syntax errors surface
/// as pest errors with their source position attached.
pub fn parse(input: &str) -> Result<Program> {
    let pair = CPLParser::parse(Rule::program, input)?.next().unwrap();
    Ok(process_program(pair))
}

fn line_of(pair: &Pair<Rule>) -> u32 {
    pair.as_span().start_pos().line_col().0 as u32
}

fn process_program(pair: Pair<Rule>) -> Program {
    debug_assert_matches!(pair.as_rule(), Rule::program);
    let mut pairs = pair.into_inner();

    let declarations = process_declarations(pairs.next().unwrap());
    let body = process_stmt_list(pairs.next().unwrap());

    Program { declarations, body }
}

fn process_declarations(pair: Pair<Rule>) -> Vec<Declaration> {
    debug_assert_matches!(pair.as_rule(), Rule::declarations);
    pair.into_inner().map(process_declaration).collect()
}

fn process_declaration(pair: Pair<Rule>) -> Declaration {
    let line = line_of(&pair);
    let mut pairs = pair.into_inner();

    let names = pairs
        .next()
        .unwrap()
        .into_inner()
        .map(|id| id.as_str().to_owned())
        .collect();
    let ty = process_type(pairs.next().unwrap());

    Declaration { names, ty, line }
}

fn process_type(pair: Pair<Rule>) -> ValueType {
    debug_assert_matches!(pair.as_rule(), Rule::var_type);
    match pair.as_str() {
        "int" => ValueType::Int,
        "float" => ValueType::Float,
        _ => unreachable!(),
    }
}

/// Accepts a `stmt_block` and yields the statements inside it.
fn process_stmt_list(pair: Pair<Rule>) -> Vec<Stmt> {
    debug_assert_matches!(pair.as_rule(), Rule::stmt_block);
    pair.into_inner().map(process_stmt).collect()
}

fn process_stmt(pair: Pair<Rule>) -> Stmt {
    debug_assert_matches!(pair.as_rule(), Rule::stmt);
    let inner = pair.into_inner().next().unwrap();
    let line = line_of(&inner);
    let rule = inner.as_rule();
    let mut pairs = inner.into_inner();

    match rule {
        Rule::assignment_stmt => Stmt::Assign {
            name: pairs.next().unwrap().as_str().to_owned(),
            value: process_expression(pairs.next().unwrap()),
            line,
        },
        Rule::input_stmt => Stmt::Input {
            name: pairs.next().unwrap().as_str().to_owned(),
            line,
        },
        Rule::output_stmt => Stmt::Output {
            value: process_expression(pairs.next().unwrap()),
            line,
        },
        Rule::if_stmt => Stmt::If {
            cond: process_boolexpr(pairs.next().unwrap()),
            then: Box::new(process_stmt(pairs.next().unwrap())),
            otherwise: Box::new(process_stmt(pairs.next().unwrap())),
            line,
        },
        Rule::while_stmt => Stmt::While {
            cond: process_boolexpr(pairs.next().unwrap()),
            body: Box::new(process_stmt(pairs.next().unwrap())),
            line,
        },
        Rule::switch_stmt => {
            let scrutinee = process_expression(pairs.next().unwrap());
            let mut cases = Vec::new();
            let mut default = Vec::new();
            for p in pairs {
                match p.as_rule() {
                    Rule::case_arm => cases.push(process_case_arm(p)),
                    Rule::stmt => default.push(process_stmt(p)),
                    _ => unreachable!(),
                }
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                line,
            }
        }
        Rule::break_stmt => Stmt::Break { line },
        Rule::stmt_block => Stmt::Block {
            body: pairs.map(process_stmt).collect(),
            line,
        },
        _ => unreachable!(),
    }
}

fn process_case_arm(pair: Pair<Rule>) -> Case {
    let mut pairs = pair.into_inner();
    let value = Number {
        text: pairs.next().unwrap().as_str().to_owned(),
        ty: ValueType::Int,
    };
    let body = pairs.map(process_stmt).collect();
    Case { value, body }
}

fn process_expression(pair: Pair<Rule>) -> Expr {
    debug_assert_matches!(pair.as_rule(), Rule::expression);
    let mut pairs = pair.into_inner();
    let mut expr = process_term(pairs.next().unwrap());

    // Flattened `term (addop term)*` folds back into a left-leaning tree.
    while let Some(op_pair) = pairs.next() {
        let op = match op_pair.as_str() {
            "+" => ArithOp::Add,
            "-" => ArithOp::Sub,
            _ => unreachable!(),
        };
        let rhs = process_term(pairs.next().unwrap());
        expr = Expr::Binary {
            op,
            lhs: Box::new(expr),
            rhs: Box::new(rhs),
        };
    }

    expr
}

fn process_term(pair: Pair<Rule>) -> Expr {
    debug_assert_matches!(pair.as_rule(), Rule::term);
    let mut pairs = pair.into_inner();
    let mut expr = process_factor(pairs.next().unwrap());

    while let Some(op_pair) = pairs.next() {
        let op = match op_pair.as_str() {
            "*" => ArithOp::Mul,
            "/" => ArithOp::Div,
            _ => unreachable!(),
        };
        let rhs = process_factor(pairs.next().unwrap());
        expr = Expr::Binary {
            op,
            lhs: Box::new(expr),
            rhs: Box::new(rhs),
        };
    }

    expr
}

fn process_factor(pair: Pair<Rule>) -> Expr {
    debug_assert_matches!(pair.as_rule(), Rule::factor);
    let inner = pair.into_inner().next().unwrap();

    match inner.as_rule() {
        Rule::expression => process_expression(inner),
        Rule::cast_int => Expr::Cast {
            to: ValueType::Int,
            value: Box::new(process_expression(inner.into_inner().next().unwrap())),
        },
        Rule::cast_float => Expr::Cast {
            to: ValueType::Float,
            value: Box::new(process_expression(inner.into_inner().next().unwrap())),
        },
        Rule::identifier => Expr::Id(inner.as_str().to_owned()),
        Rule::number => process_number(inner),
        _ => unreachable!(),
    }
}

fn process_number(pair: Pair<Rule>) -> Expr {
    let inner = pair.into_inner().next().unwrap();
    let ty = match inner.as_rule() {
        Rule::int_number => ValueType::Int,
        Rule::float_number => ValueType::Float,
        _ => unreachable!(),
    };
    Expr::Num(Number {
        text: inner.as_str().to_owned(),
        ty,
    })
}

fn process_boolexpr(pair: Pair<Rule>) -> BoolExpr {
    debug_assert_matches!(pair.as_rule(), Rule::boolexpr);
    let mut pairs = pair.into_inner();
    let mut expr = process_boolterm(pairs.next().unwrap());

    for term in pairs {
        expr = BoolExpr::Or(Box::new(expr), Box::new(process_boolterm(term)));
    }

    expr
}

fn process_boolterm(pair: Pair<Rule>) -> BoolExpr {
    debug_assert_matches!(pair.as_rule(), Rule::boolterm);
    let mut pairs = pair.into_inner();
    let mut expr = process_boolfactor(pairs.next().unwrap());

    for factor in pairs {
        expr = BoolExpr::And(Box::new(expr), Box::new(process_boolfactor(factor)));
    }

    expr
}

fn process_boolfactor(pair: Pair<Rule>) -> BoolExpr {
    debug_assert_matches!(pair.as_rule(), Rule::boolfactor);
    let inner = pair.into_inner().next().unwrap();

    match inner.as_rule() {
        Rule::not_factor => BoolExpr::Not(Box::new(process_boolexpr(
            inner.into_inner().next().unwrap(),
        ))),
        Rule::relop_expr => {
            let mut pairs = inner.into_inner();
            let lhs = process_expression(pairs.next().unwrap());
            let op = match pairs.next().unwrap().as_str() {
                "==" => RelOp::Eql,
                "!=" => RelOp::Nql,
                "<=" => RelOp::Leq,
                ">=" => RelOp::Geq,
                "<" => RelOp::Lss,
                ">" => RelOp::Grt,
                _ => unreachable!(),
            };
            let rhs = process_expression(pairs.next().unwrap());
            BoolExpr::Relop { op, lhs, rhs }
        }
        _ => unreachable!(),
    }
}
