//! Expression language
//!
//! A small, sandboxed language used for `if` conditions and inside `{{ }}`
//! template markers. It only knows about variable references, literals,
//! comparisons, logical connectives and a handful of string helpers.
//!
//! Supported forms:
//! - `.name`, `.name.field` - variable reference (missing variables are null)
//! - `"text"`, `` `text` ``, `42`, `true`, `false` - literals
//! - `eq A B`, `ne A B`, `A == B`, `A != B` - equality tests
//! - `exists .name` - existence test
//! - `and A B...`, `or A B...`, `not A`, `A && B`, `A || B`, `!A` - logic
//! - `upper`, `lower`, `title`, `snake`, `kebab` - helpers
//! - `env "PATH"` - the path env var (no other variable is exposed)
//! - `( ... )` - grouping

use crate::config::Values;
use crate::error::{ExpressionError, ExpressionResult};
use crate::runner::Context;
use serde_yaml::Value;
use std::iter::Peekable;
use std::str::CharIndices;

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable reference, as a path of field names
    Var(Vec<String>),
    /// Literal value
    Literal(Value),
    /// Function call in prefix form (`eq .a 1`)
    Call { name: String, args: Vec<Expr> },
    /// `!A`
    Not(Box<Expr>),
    /// `A && B`
    And(Box<Expr>, Box<Expr>),
    /// `A || B`
    Or(Box<Expr>, Box<Expr>),
    /// `A == B` / `A != B`
    Compare {
        negated: bool,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Variables and auxiliary inputs an expression is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub values: &'a Values,
    pub path_env_var: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn new(values: &'a Values) -> Self {
        Scope {
            values,
            path_env_var: None,
        }
    }

    pub fn with_path_env_var(mut self, path_env_var: &'a str) -> Self {
        self.path_env_var = Some(path_env_var);
        self
    }
}

/// Evaluate a boolean expression against the context's current values
///
/// The result is true iff `{{if EXPR}}true{{end}}` would render exactly
/// `true`, that is iff the expression value is truthy. Parse and evaluation
/// failures are errors, never `false`.
pub fn eval_bool_expression(ctx: &Context, expression: &str) -> ExpressionResult<bool> {
    let scope = Scope::new(&ctx.values).with_path_env_var(&ctx.path_env_var);
    let rendered = render_if(&scope, expression)?;
    Ok(rendered == "true")
}

/// Render the implicit `{{if EXPR}}true{{end}}` construct
fn render_if(scope: &Scope<'_>, expression: &str) -> ExpressionResult<String> {
    let expr = parse_expression(expression)?;
    let value = evaluate(&expr, scope, expression)?;
    Ok(if is_truthy(&value) {
        "true".to_string()
    } else {
        String::new()
    })
}

/// Parse an expression string
pub fn parse_expression(expression: &str) -> ExpressionResult<Expr> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source: expression,
    };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(format!("unexpected {}", token.describe())));
    }
    Ok(expr)
}

/// Parse and evaluate an expression to a value
pub fn eval_expression(scope: &Scope<'_>, expression: &str) -> ExpressionResult<Value> {
    let expr = parse_expression(expression)?;
    evaluate(&expr, scope, expression)
}

/// Truthiness of a value, following the usual template rules
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Render a value as template output text
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Var(Vec<String>),
    Str(String),
    Number(String),
    Ident(String),
    LParen,
    RParen,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Var(path) => format!("variable '.{}'", path.join(".")),
            Token::Str(s) => format!("string {:?}", s),
            Token::Number(n) => format!("number {}", n),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::EqEq => "'=='".to_string(),
            Token::NotEq => "'!='".to_string(),
            Token::AndAnd => "'&&'".to_string(),
            Token::OrOr => "'||'".to_string(),
            Token::Bang => "'!'".to_string(),
        }
    }

    fn starts_operand(&self) -> bool {
        match self {
            Token::Var(_) | Token::Str(_) | Token::Number(_) | Token::LParen => true,
            Token::Ident(name) => name == "true" || name == "false",
            _ => false,
        }
    }
}

fn parse_error(expression: &str, message: impl Into<String>) -> ExpressionError {
    ExpressionError::Parse {
        expression: expression.to_string(),
        message: message.into(),
    }
}

fn eval_error(expression: &str, message: impl Into<String>) -> ExpressionError {
    ExpressionError::Evaluation {
        expression: expression.to_string(),
        message: message.into(),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn read_ident(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

fn tokenize(expression: &str) -> ExpressionResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                let mut path = Vec::new();
                while let Some(&(_, '.')) = chars.peek() {
                    chars.next();
                    match chars.peek() {
                        Some(&(_, c)) if is_ident_start(c) => path.push(read_ident(&mut chars)),
                        _ => {
                            return Err(parse_error(
                                expression,
                                format!("expected variable name after '.' at position {}", pos),
                            ))
                        }
                    }
                }
                tokens.push(Token::Var(path));
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, 'n')) => s.push('\n'),
                            Some((_, 't')) => s.push('\t'),
                            Some((_, c @ ('"' | '\\'))) => s.push(c),
                            Some((_, c)) => {
                                return Err(parse_error(
                                    expression,
                                    format!("unknown escape sequence '\\{}'", c),
                                ))
                            }
                            None => return Err(parse_error(expression, "unterminated string")),
                        },
                        Some((_, c)) => s.push(c),
                        None => return Err(parse_error(expression, "unterminated string")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '`' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '`')) => break,
                        Some((_, c)) => s.push(c),
                        None => return Err(parse_error(expression, "unterminated raw string")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || c == '-' => {
                chars.next();
                let mut number = c.to_string();
                while let Some(&(_, c)) = chars.peek() {
                    if !(c.is_ascii_digit() || c == '.') {
                        break;
                    }
                    number.push(c);
                    chars.next();
                }
                if number.parse::<f64>().is_err() {
                    return Err(parse_error(
                        expression,
                        format!("invalid number '{}' at position {}", number, pos),
                    ));
                }
                tokens.push(Token::Number(number));
            }
            c if is_ident_start(c) => {
                tokens.push(Token::Ident(read_ident(&mut chars)));
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' | '&' | '|' => {
                chars.next();
                match chars.next() {
                    Some((_, next)) if next == c => tokens.push(match c {
                        '=' => Token::EqEq,
                        '&' => Token::AndAnd,
                        _ => Token::OrOr,
                    }),
                    _ => {
                        return Err(parse_error(
                            expression,
                            format!("unexpected character '{}' at position {}", c, pos),
                        ))
                    }
                }
            }
            '!' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    tokens.push(Token::Bang);
                }
            }
            other => {
                return Err(parse_error(
                    expression,
                    format!("unexpected character '{}' at position {}", other, pos),
                ))
            }
        }
    }

    if tokens.is_empty() {
        return Err(parse_error(expression, "missing value"));
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        parse_error(self.source, message)
    }

    fn parse_or(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.next();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ExpressionResult<Expr> {
        if self.peek() == Some(&Token::Bang) {
            self.next();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ExpressionResult<Expr> {
        let left = self.parse_command()?;
        let negated = match self.peek() {
            Some(Token::EqEq) => false,
            Some(Token::NotEq) => true,
            _ => return Ok(left),
        };
        self.next();
        let right = self.parse_command()?;
        Ok(Expr::Compare {
            negated,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_command(&mut self) -> ExpressionResult<Expr> {
        match self.peek() {
            Some(Token::Ident(name)) if name != "true" && name != "false" => {
                let name = name.clone();
                self.next();
                let mut args = Vec::new();
                while self.peek().map(Token::starts_operand).unwrap_or(false) {
                    args.push(self.parse_operand()?);
                }
                Ok(Expr::Call { name, args })
            }
            _ => self.parse_operand(),
        }
    }

    fn parse_operand(&mut self) -> ExpressionResult<Expr> {
        match self.next() {
            Some(Token::Var(path)) => Ok(Expr::Var(path)),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Number(n)) => Ok(Expr::Literal(number_value(&n))),
            Some(Token::Ident(name)) if name == "true" => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::Ident(name)) if name == "false" => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(self.error(format!("expected ')', found {}", token.describe()))),
                    None => Err(self.error("unclosed '('")),
                }
            }
            Some(token) => Err(self.error(format!("unexpected {}", token.describe()))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

fn number_value(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(i) => Value::Number(i.into()),
        Err(_) => Value::Number(text.parse::<f64>().unwrap_or_default().into()),
    }
}

/// Evaluate a parsed expression
pub fn evaluate(expr: &Expr, scope: &Scope<'_>, source: &str) -> ExpressionResult<Value> {
    match expr {
        Expr::Var(path) => lookup(scope.values, path, source),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Not(inner) => Ok(Value::Bool(!is_truthy(&evaluate(inner, scope, source)?))),
        Expr::And(left, right) => {
            if !is_truthy(&evaluate(left, scope, source)?) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(is_truthy(&evaluate(right, scope, source)?)))
        }
        Expr::Or(left, right) => {
            if is_truthy(&evaluate(left, scope, source)?) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(is_truthy(&evaluate(right, scope, source)?)))
        }
        Expr::Compare {
            negated,
            left,
            right,
        } => {
            let left = evaluate(left, scope, source)?;
            let right = evaluate(right, scope, source)?;
            Ok(Value::Bool(values_equal(&left, &right, source)? != *negated))
        }
        Expr::Call { name, args } => call(name, args, scope, source),
    }
}

fn lookup(values: &Values, path: &[String], source: &str) -> ExpressionResult<Value> {
    let Some((first, rest)) = path.split_first() else {
        return Err(eval_error(source, "empty variable reference"));
    };

    let mut current = match values.get(first) {
        Some(value) => value,
        None => return Ok(Value::Null),
    };
    for (depth, field) in rest.iter().enumerate() {
        current = match current {
            Value::Mapping(map) => match map.get(field.as_str()) {
                Some(value) => value,
                None => return Ok(Value::Null),
            },
            Value::Null => return Ok(Value::Null),
            _ => {
                return Err(eval_error(
                    source,
                    format!(
                        "can't evaluate field '{}' of non-mapping variable '.{}'",
                        field,
                        path[..=depth].join(".")
                    ),
                ))
            }
        };
    }
    Ok(current.clone())
}

fn values_equal(left: &Value, right: &Value, source: &str) -> ExpressionResult<bool> {
    for value in [left, right] {
        if matches!(value, Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_)) {
            return Err(eval_error(source, "cannot compare structured values"));
        }
    }

    Ok(match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            match (as_number(left), as_number(right)) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
        _ => value_to_string(left) == value_to_string(right),
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn expect_args(name: &str, args: &[Expr], expected: usize, source: &str) -> ExpressionResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(eval_error(
            source,
            format!(
                "wrong number of arguments for {}: want {} got {}",
                name,
                expected,
                args.len()
            ),
        ))
    }
}

fn string_arg(name: &str, args: &[Expr], scope: &Scope<'_>, source: &str) -> ExpressionResult<String> {
    expect_args(name, args, 1, source)?;
    Ok(value_to_string(&evaluate(&args[0], scope, source)?))
}

fn call(name: &str, args: &[Expr], scope: &Scope<'_>, source: &str) -> ExpressionResult<Value> {
    match name {
        "eq" | "ne" => {
            expect_args(name, args, 2, source)?;
            let left = evaluate(&args[0], scope, source)?;
            let right = evaluate(&args[1], scope, source)?;
            let equal = values_equal(&left, &right, source)?;
            Ok(Value::Bool(if name == "eq" { equal } else { !equal }))
        }
        "and" | "or" => {
            if args.len() < 2 {
                return Err(eval_error(
                    source,
                    format!("wrong number of arguments for {}: want at least 2", name),
                ));
            }
            // Short-circuits like the infix forms.
            let stop_on = name == "or";
            for arg in args {
                if is_truthy(&evaluate(arg, scope, source)?) == stop_on {
                    return Ok(Value::Bool(stop_on));
                }
            }
            Ok(Value::Bool(!stop_on))
        }
        "not" => {
            expect_args(name, args, 1, source)?;
            Ok(Value::Bool(!is_truthy(&evaluate(&args[0], scope, source)?)))
        }
        "exists" => {
            expect_args(name, args, 1, source)?;
            match &args[0] {
                Expr::Var(path) => Ok(Value::Bool(!lookup(scope.values, path, source)?.is_null())),
                _ => Err(eval_error(source, "exists expects a variable reference")),
            }
        }
        "upper" => Ok(Value::String(string_arg(name, args, scope, source)?.to_uppercase())),
        "lower" => Ok(Value::String(string_arg(name, args, scope, source)?.to_lowercase())),
        "title" => Ok(Value::String(title_case(&string_arg(name, args, scope, source)?))),
        "snake" => Ok(Value::String(split_words(&string_arg(name, args, scope, source)?).join("_"))),
        "kebab" => Ok(Value::String(split_words(&string_arg(name, args, scope, source)?).join("-"))),
        "env" => {
            // Only the path env var is visible; the process environment is not
            let var = string_arg(name, args, scope, source)?;
            if var != "PATH" {
                return Err(eval_error(
                    source,
                    format!("env: variable \"{}\" is not available", var),
                ));
            }
            Ok(Value::String(scope.path_env_var.unwrap_or_default().to_string()))
        }
        other => Err(eval_error(source, format!("function \"{}\" not defined", other))),
    }
}

/// Capitalize the first letter of every whitespace-separated word
fn title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            result.push(c);
        } else if at_word_start {
            at_word_start = false;
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Split an identifier-like string into lowercase words
///
/// Boundaries are non-alphanumeric characters and lower-to-upper case
/// transitions (`myProject-name` -> `my`, `project`, `name`).
fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in s.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
