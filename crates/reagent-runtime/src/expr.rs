//! Arithmetic and relational expression evaluator.
//!
//! A small shunting-yard evaluator over `f64`, used by `if`, `while`, and
//! `math.calc`. It is a pure function: callers resolve variables first and
//! hand in a plain numeric environment.
//!
//! Grammar: decimal literals (optionally with a fractional part), identifiers
//! `[A-Za-z_][A-Za-z0-9_]*`, the operators `+ - * /`, the relations
//! `> < >= <= == !=`, and parentheses.
//!
//! Precedence, high to low, all left-associative:
//!
//!   3  `*` `/`
//!   2  `+` `-`
//!   1  `>` `<` `>=` `<=` `==` `!=`
//!
//! Relations evaluate to `1` or `0`. An identifier that is missing from the
//! environment, or maps to NaN, evaluates to `0`. An empty expression
//! evaluates to `0`. An unbalanced expression is an error.

use reagent_core::{VmError, VmResult};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl BinOp {
    fn precedence(self) -> u8 {
        match self {
            BinOp::Mul | BinOp::Div => 3,
            BinOp::Add | BinOp::Sub => 2,
            BinOp::Gt | BinOp::Lt | BinOp::Ge | BinOp::Le | BinOp::Eq | BinOp::Ne => 1,
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Gt => bool_num(a > b),
            BinOp::Lt => bool_num(a < b),
            BinOp::Ge => bool_num(a >= b),
            BinOp::Le => bool_num(a <= b),
            BinOp::Eq => bool_num(a == b),
            BinOp::Ne => bool_num(a != b),
        }
    }
}

fn bool_num(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(BinOp),
    LParen,
    RParen,
}

/// Entries on the operator stack; parentheses act as precedence floors.
#[derive(Clone, Copy, Debug)]
enum StackOp {
    Op(BinOp),
    LParen,
}

fn lex(expr: &str) -> VmResult<Vec<Token>> {
    let mut tokens = Vec::with_capacity(expr.len() / 2 + 1);
    let bytes = expr.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Op(BinOp::Add));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Op(BinOp::Sub));
                i += 1;
            }
            '*' => {
                tokens.push(Token::Op(BinOp::Mul));
                i += 1;
            }
            '/' => {
                tokens.push(Token::Op(BinOp::Div));
                i += 1;
            }
            '>' | '<' | '=' | '!' => {
                let next_eq = bytes.get(i + 1) == Some(&b'=');
                let op = match (c, next_eq) {
                    ('>', true) => BinOp::Ge,
                    ('>', false) => BinOp::Gt,
                    ('<', true) => BinOp::Le,
                    ('<', false) => BinOp::Lt,
                    ('=', true) => BinOp::Eq,
                    ('!', true) => BinOp::Ne,
                    _ => {
                        return Err(VmError::Expr(format!(
                            "unexpected character '{c}' at offset {i}"
                        )));
                    }
                };
                tokens.push(Token::Op(op));
                i += if next_eq { 2 } else { 1 };
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len() && bytes[i] == b'.' {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text = &expr[start..i];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| VmError::Expr(format!("malformed number '{text}'")))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(expr[start..i].to_string()));
            }
            _ => {
                return Err(VmError::Expr(format!(
                    "unexpected character '{c}' at offset {i}"
                )));
            }
        }
    }

    Ok(tokens)
}

fn apply_top(values: &mut Vec<f64>, op: BinOp) -> VmResult<()> {
    let b = values
        .pop()
        .ok_or_else(|| VmError::Expr("unbalanced expression".to_string()))?;
    let a = values
        .pop()
        .ok_or_else(|| VmError::Expr("unbalanced expression".to_string()))?;
    values.push(op.apply(a, b));
    Ok(())
}

/// Evaluates an expression against a numeric environment.
pub fn evaluate(expr: &str, vars: &HashMap<String, f64>) -> VmResult<f64> {
    let tokens = lex(expr)?;

    let mut values: Vec<f64> = Vec::with_capacity(tokens.len());
    let mut ops: Vec<StackOp> = Vec::with_capacity(tokens.len());

    for token in tokens {
        match token {
            Token::Number(n) => values.push(n),
            Token::Ident(name) => {
                let value = vars
                    .get(&name)
                    .copied()
                    .filter(|v| !v.is_nan())
                    .unwrap_or(0.0);
                values.push(value);
            }
            Token::Op(op) => {
                while let Some(StackOp::Op(top)) = ops.last().copied() {
                    if top.precedence() >= op.precedence() {
                        ops.pop();
                        apply_top(&mut values, top)?;
                    } else {
                        break;
                    }
                }
                ops.push(StackOp::Op(op));
            }
            Token::LParen => ops.push(StackOp::LParen),
            Token::RParen => loop {
                match ops.pop() {
                    Some(StackOp::Op(op)) => apply_top(&mut values, op)?,
                    Some(StackOp::LParen) => break,
                    None => return Err(VmError::Expr("unmatched ')'".to_string())),
                }
            },
        }
    }

    while let Some(entry) = ops.pop() {
        match entry {
            StackOp::Op(op) => apply_top(&mut values, op)?,
            StackOp::LParen => return Err(VmError::Expr("unmatched '('".to_string())),
        }
    }

    match values.len() {
        0 => Ok(0.0),
        1 => Ok(values[0]),
        _ => Err(VmError::Expr("unbalanced expression".to_string())),
    }
}
