use crate::error::FormulaError;

/// Maximum parenthesis / unary nesting accepted in a formula.
pub const MAX_DEPTH: usize = 64;

/// Maximum number of tokens in a formula. Chained operators build a
/// left-deep tree, so this also bounds the depth of every tree walk.
pub const MAX_TOKENS: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Placeholder(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Placeholder(name) => format!("placeholder {{{}}}", name),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

/// Split a formula into tokens in a single left-to-right pass.
///
/// A placeholder is everything between `{` and the next `}`, taken verbatim.
/// Names never pass through substring replacement, so one subfactor name
/// containing another cannot bleed into it.
pub fn tokenize(src: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '*' => tokens.push(Token::Star),
            '/' => tokens.push(Token::Slash),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (inner_pos, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(FormulaError::NestedPlaceholder { pos: inner_pos }),
                        other => name.push(other),
                    }
                }
                if !closed {
                    return Err(FormulaError::UnterminatedPlaceholder { pos });
                }
                if name.trim().is_empty() {
                    return Err(FormulaError::EmptyPlaceholder { pos });
                }
                tokens.push(Token::Placeholder(name));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut text = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        text.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = text
                    .parse()
                    .map_err(|_| FormulaError::InvalidNumber { text: text.clone() })?;
                tokens.push(Token::Number(value));
            }
            other => return Err(FormulaError::UnexpectedChar { ch: other, pos }),
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    /// Index into `Formula::placeholders`.
    Var(usize),
    Neg(Box<Expr>),
    Bin(Box<Expr>, BinOp, Box<Expr>),
}

/// A parsed category formula.
///
/// Evaluation only ever sees numbers bound to placeholder slots: there is no
/// name lookup, no function call and nothing outside the four operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
    /// Distinct placeholder names, in order of first appearance.
    placeholders: Vec<String>,
    /// Every placeholder occurrence, repeats included.
    occurrences: Vec<String>,
}

impl Formula {
    pub fn parse(src: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(src)?;
        if tokens.len() > MAX_TOKENS {
            return Err(FormulaError::TooLong {
                count: tokens.len(),
                max: MAX_TOKENS,
            });
        }
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            placeholders: Vec::new(),
            occurrences: Vec::new(),
        };
        let expr = parser.expr(0)?;
        if let Some(extra) = parser.peek() {
            return Err(FormulaError::UnexpectedToken {
                found: extra.describe(),
            });
        }
        Ok(Formula {
            expr,
            placeholders: parser.placeholders,
            occurrences: parser.occurrences,
        })
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn occurrences(&self) -> &[String] {
        &self.occurrences
    }

    /// Evaluate with `values[i]` bound to `placeholders()[i]`.
    pub fn eval(&self, values: &[f64]) -> Result<f64, FormulaError> {
        if values.len() != self.placeholders.len() {
            return Err(FormulaError::BindingCount {
                expected: self.placeholders.len(),
                got: values.len(),
            });
        }
        let result = eval_expr(&self.expr, values)?;
        if result.is_finite() {
            Ok(result)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    /// True if some `/` has a right-hand side that is constant and zero.
    pub fn divides_by_constant_zero(&self) -> bool {
        has_constant_zero_divisor(&self.expr)
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    placeholders: Vec<String>,
    occurrences: Vec<String>,
}

impl Parser<'_> {
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

    // expr := term (('+' | '-') term)*
    fn expr(&mut self, depth: usize) -> Result<Expr, FormulaError> {
        let mut lhs = self.term(depth)?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term(depth)?;
            lhs = Expr::Bin(Box::new(lhs), op, Box::new(rhs));
        }
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self, depth: usize) -> Result<Expr, FormulaError> {
        let mut lhs = self.factor(depth)?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.factor(depth)?;
            lhs = Expr::Bin(Box::new(lhs), op, Box::new(rhs));
        }
    }

    // factor := ('+' | '-') factor | number | placeholder | '(' expr ')'
    fn factor(&mut self, depth: usize) -> Result<Expr, FormulaError> {
        if depth >= MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        match self.next() {
            Some(Token::Plus) => self.factor(depth + 1),
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.factor(depth + 1)?))),
            Some(Token::Number(n)) => Ok(Expr::Num(n)),
            Some(Token::Placeholder(name)) => {
                self.occurrences.push(name.clone());
                let index = match self.placeholders.iter().position(|p| *p == name) {
                    Some(index) => index,
                    None => {
                        self.placeholders.push(name);
                        self.placeholders.len() - 1
                    }
                };
                Ok(Expr::Var(index))
            }
            Some(Token::LParen) => {
                let inner = self.expr(depth + 1)?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(FormulaError::UnexpectedToken {
                        found: other.describe(),
                    }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(other) => Err(FormulaError::UnexpectedToken {
                found: other.describe(),
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

fn eval_expr(expr: &Expr, values: &[f64]) -> Result<f64, FormulaError> {
    match expr {
        Expr::Num(n) => Ok(*n),
        Expr::Var(index) => Ok(values[*index]),
        Expr::Neg(inner) => Ok(-eval_expr(inner, values)?),
        Expr::Bin(lhs, op, rhs) => {
            let a = eval_expr(lhs, values)?;
            let b = eval_expr(rhs, values)?;
            match op {
                BinOp::Add => Ok(a + b),
                BinOp::Sub => Ok(a - b),
                BinOp::Mul => Ok(a * b),
                BinOp::Div => {
                    if b == 0.0 {
                        Err(FormulaError::DivisionByZero)
                    } else {
                        Ok(a / b)
                    }
                }
            }
        }
    }
}

/// Value of a subexpression that references no placeholder.
fn constant_value(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Num(n) => Some(*n),
        Expr::Var(_) => None,
        Expr::Neg(inner) => constant_value(inner).map(|v| -v),
        Expr::Bin(lhs, op, rhs) => {
            let a = constant_value(lhs)?;
            let b = constant_value(rhs)?;
            match op {
                BinOp::Add => Some(a + b),
                BinOp::Sub => Some(a - b),
                BinOp::Mul => Some(a * b),
                BinOp::Div => Some(a / b),
            }
        }
    }
}

fn has_constant_zero_divisor(expr: &Expr) -> bool {
    match expr {
        Expr::Num(_) | Expr::Var(_) => false,
        Expr::Neg(inner) => has_constant_zero_divisor(inner),
        Expr::Bin(lhs, op, rhs) => {
            (*op == BinOp::Div && constant_value(rhs) == Some(0.0))
                || has_constant_zero_divisor(lhs)
                || has_constant_zero_divisor(rhs)
        }
    }
}
