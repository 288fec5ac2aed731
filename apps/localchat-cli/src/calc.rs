//! `calc:` tool: arithmetic over numbers, `+ - * / // **` and parentheses.
//!
//! Integers stay integers under `+ - * // **`; `/` always produces a float.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

pub const TRIGGER: &str = "calc:";
pub const INVALID_FORMAT: &str = "Invalid calc format. Only numbers and + - * / ( ) are allowed.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool { self.as_f64() == 0.0 }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{:.1}", x),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected '{0}' at position {1}")]
    Unexpected(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("result is not a real number")]
    NotReal,
}

/// Reply text when `message` starts with `calc:` (any case), else `None`.
pub fn try_calculator(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if !trimmed.to_lowercase().starts_with(TRIGGER) { return None; }
    let expr = trimmed.split_once(':').map(|(_, e)| e.trim()).unwrap_or_default();
    if !is_allowed(expr) { return Some(INVALID_FORMAT.to_string()); }
    Some(match evaluate(expr) {
        Ok(n) => format!("Result: {}", n),
        Err(e) => format!("Calculation error: {}", e),
    })
}

fn is_allowed(expr: &str) -> bool {
    !expr.is_empty() && expr.chars().all(|c| c.is_ascii_digit() || c.is_whitespace() || "+-*/().".contains(c))
}

pub fn evaluate(expr: &str) -> Result<Number, CalcError> {
    let tokens = lex(expr)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(value),
        Some(&(_, at)) => Err(CalcError::Unexpected(expr[at..].chars().next().unwrap_or(' '), at)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Num(Number),
    Plus,
    Minus,
    Star,
    Pow,
    Slash,
    FloorDiv,
    Open,
    Close,
}

fn lex(expr: &str) -> Result<Vec<(Tok, usize)>, CalcError> {
    let mut out = Vec::new();
    let mut chars: Peekable<CharIndices<'_>> = expr.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        let tok = match c {
            c if c.is_whitespace() => continue,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' if chars.next_if(|&(_, n)| n == '*').is_some() => Tok::Pow,
            '*' => Tok::Star,
            '/' if chars.next_if(|&(_, n)| n == '/').is_some() => Tok::FloorDiv,
            '/' => Tok::Slash,
            '(' => Tok::Open,
            ')' => Tok::Close,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = at + c.len_utf8();
                while let Some((i, n)) = chars.next_if(|&(_, n)| n.is_ascii_digit() || n == '.') { end = i + n.len_utf8(); }
                Tok::Num(parse_number(&expr[at..end])?)
            }
            other => return Err(CalcError::Unexpected(other, at)),
        };
        out.push((tok, at));
    }
    Ok(out)
}

fn parse_number(text: &str) -> Result<Number, CalcError> {
    let invalid = || CalcError::InvalidNumber(text.to_string());
    if text.contains('.') {
        if text == "." || text.matches('.').count() > 1 { return Err(invalid()); }
        return text.parse::<f64>().map(Number::Float).map_err(|_| invalid());
    }
    text.parse::<i64>().map(Number::Int).map_err(|_| CalcError::Overflow)
}

struct Parser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Tok> { self.tokens.get(self.pos).map(|&(t, _)| t) }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.peek();
        if t.is_some() { self.pos += 1; }
        t
    }

    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut acc = self.term()?;
        while let Some(op @ (Tok::Plus | Tok::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = arith(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Number, CalcError> {
        let mut acc = self.unary()?;
        while let Some(op @ (Tok::Star | Tok::Slash | Tok::FloorDiv)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = arith(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Number, CalcError> {
        match self.peek() {
            Some(Tok::Plus) => { self.pos += 1; self.unary() }
            Some(Tok::Minus) => {
                self.pos += 1;
                match self.unary()? {
                    Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(CalcError::Overflow),
                    Number::Float(f) => Ok(Number::Float(-f)),
                }
            }
            _ => self.power(),
        }
    }

    // `**` binds tighter than unary minus on its left and is right-associative.
    fn power(&mut self) -> Result<Number, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(Tok::Pow) {
            self.pos += 1;
            let exp = self.unary()?;
            return pow(base, exp);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, CalcError> {
        let at = self.tokens.get(self.pos).map(|&(_, at)| at);
        match self.bump() {
            Some(Tok::Num(n)) => Ok(n),
            Some(Tok::Open) => {
                let inner = self.expr()?;
                match self.bump() {
                    Some(Tok::Close) => Ok(inner),
                    Some(t) => Err(CalcError::Unexpected(symbol(t), self.tokens[self.pos - 1].1)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(t) => Err(CalcError::Unexpected(symbol(t), at.unwrap_or_default())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

fn symbol(t: Tok) -> char {
    match t {
        Tok::Plus => '+',
        Tok::Minus => '-',
        Tok::Star | Tok::Pow => '*',
        Tok::Slash | Tok::FloorDiv => '/',
        Tok::Open => '(',
        Tok::Close => ')',
        Tok::Num(_) => '#',
    }
}

fn arith(op: Tok, a: Number, b: Number) -> Result<Number, CalcError> {
    use Number::{Float, Int};
    match (op, a, b) {
        (Tok::Slash | Tok::FloorDiv, _, b) if b.is_zero() => Err(CalcError::DivisionByZero),
        (Tok::Slash, a, b) => Ok(Float(a.as_f64() / b.as_f64())),
        (Tok::FloorDiv, Int(x), Int(y)) => Ok(Int(floor_div(x, y).ok_or(CalcError::Overflow)?)),
        (Tok::FloorDiv, a, b) => Ok(Float((a.as_f64() / b.as_f64()).floor())),
        (Tok::Plus, Int(x), Int(y)) => x.checked_add(y).map(Int).ok_or(CalcError::Overflow),
        (Tok::Minus, Int(x), Int(y)) => x.checked_sub(y).map(Int).ok_or(CalcError::Overflow),
        (Tok::Star, Int(x), Int(y)) => x.checked_mul(y).map(Int).ok_or(CalcError::Overflow),
        (Tok::Plus, a, b) => Ok(Float(a.as_f64() + b.as_f64())),
        (Tok::Minus, a, b) => Ok(Float(a.as_f64() - b.as_f64())),
        (Tok::Star, a, b) => Ok(Float(a.as_f64() * b.as_f64())),
        (t, _, _) => Err(CalcError::Unexpected(symbol(t), 0)),
    }
}

fn floor_div(x: i64, y: i64) -> Option<i64> {
    let q = x.checked_div(y)?;
    if x % y != 0 && ((x < 0) != (y < 0)) { q.checked_sub(1) } else { Some(q) }
}

fn pow(base: Number, exp: Number) -> Result<Number, CalcError> {
    if base.is_zero() && exp.as_f64() < 0.0 { return Err(CalcError::DivisionByZero); }
    if let (Number::Int(b), Number::Int(e)) = (base, exp) {
        if e >= 0 {
            let e = u32::try_from(e).map_err(|_| CalcError::Overflow)?;
            return b.checked_pow(e).map(Number::Int).ok_or(CalcError::Overflow);
        }
    }
    let v = base.as_f64().powf(exp.as_f64());
    if v.is_nan() { return Err(CalcError::NotReal); }
    Ok(Number::Float(v))
}
