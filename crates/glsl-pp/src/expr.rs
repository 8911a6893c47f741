//! `#if` / `#elif` expression evaluation
//!
//! Conditions are parsed into a small expression tree and then evaluated
//! over `i64`. Parsing first and evaluating second lets `&&` and `||` skip
//! their right operand, so `0 && 1 / 0` is false rather than an error.
//!
//! `defined` must already have been replaced and macros expanded by the
//! time tokens get here; any identifier left over is an error.

use crate::error::{LocatedError, PreprocessorError};
use crate::lexer::{Token, TokenValue};
use crate::token::{Location, Punct};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Neg,
    /// `~x`
    BitNot,
    /// `!x`
    Not,
}

/// Binary operators, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&`
    BitAnd,
    /// `^`
    BitXor,
    /// `|`
    BitOr,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOp {
    fn from_punct(punct: Punct) -> Option<Self> {
        Some(match punct {
            Punct::Star => BinaryOp::Mul,
            Punct::Slash => BinaryOp::Div,
            Punct::Percent => BinaryOp::Rem,
            Punct::Plus => BinaryOp::Add,
            Punct::Minus => BinaryOp::Sub,
            Punct::LeftShift => BinaryOp::Shl,
            Punct::RightShift => BinaryOp::Shr,
            Punct::LeftAngle => BinaryOp::Lt,
            Punct::RightAngle => BinaryOp::Gt,
            Punct::LessEqual => BinaryOp::Le,
            Punct::GreaterEqual => BinaryOp::Ge,
            Punct::EqualEqual => BinaryOp::Eq,
            Punct::NotEqual => BinaryOp::Ne,
            Punct::Ampersand => BinaryOp::BitAnd,
            Punct::Caret => BinaryOp::BitXor,
            Punct::Pipe => BinaryOp::BitOr,
            Punct::LogicalAnd => BinaryOp::And,
            Punct::LogicalOr => BinaryOp::Or,
            _ => return None,
        })
    }

    /// Binding power; higher binds tighter.
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 7,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
        }
    }
}

/// A parsed preprocessor expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An integer literal
    Integer(i64),

    /// A unary operation
    Unary {
        /// The operator
        op: UnaryOp,
        /// Its operand
        operand: Box<Expr>,
    },

    /// A binary operation
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
        /// Where the operator is, for error reporting
        location: Location,
    },
}

impl Expr {
    /// Evaluate the expression.
    pub fn eval(&self) -> Result<i64, LocatedError> {
        match self {
            Expr::Integer(value) => Ok(*value),
            Expr::Unary { op, operand } => {
                let value = operand.eval()?;
                Ok(match op {
                    UnaryOp::Plus => value,
                    UnaryOp::Neg => value.wrapping_neg(),
                    UnaryOp::BitNot => !value,
                    UnaryOp::Not => i64::from(value == 0),
                })
            }
            Expr::Binary {
                op,
                left,
                right,
                location,
            } => eval_binary(*op, left, right, *location),
        }
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    location: Location,
) -> Result<i64, LocatedError> {
    let l = left.eval()?;

    // Short-circuit evaluation for && and ||
    let r = match op {
        BinaryOp::And if l == 0 => return Ok(0),
        BinaryOp::Or if l != 0 => return Ok(1),
        _ => right.eval()?,
    };

    let value = match op {
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div | BinaryOp::Rem if r == 0 => {
            return Err(LocatedError::new(PreprocessorError::DivisionByZero, location))
        }
        BinaryOp::Div => l.wrapping_div(r),
        BinaryOp::Rem => l.wrapping_rem(r),
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Shl => l.wrapping_shl(r as u32),
        BinaryOp::Shr => l.wrapping_shr(r as u32),
        BinaryOp::Lt => i64::from(l < r),
        BinaryOp::Gt => i64::from(l > r),
        BinaryOp::Le => i64::from(l <= r),
        BinaryOp::Ge => i64::from(l >= r),
        BinaryOp::Eq => i64::from(l == r),
        BinaryOp::Ne => i64::from(l != r),
        BinaryOp::BitAnd => l & r,
        BinaryOp::BitXor => l ^ r,
        BinaryOp::BitOr => l | r,
        BinaryOp::And | BinaryOp::Or => i64::from(r != 0),
    };
    Ok(value)
}

/// Deepest nesting of parentheses and unary operators in a condition.
pub const MAX_NESTING: usize = 256;

/// Most binary operators in a single condition.
pub const MAX_BINARY_OPERATORS: usize = 1024;

/// Parse and evaluate a condition.
///
/// `end` is where the directive line ends, used when an operand is missing.
pub fn evaluate(tokens: &[Token], end: Location) -> Result<i64, LocatedError> {
    parse(tokens, end)?.eval()
}

/// Parse a condition into an [`Expr`].
pub fn parse(tokens: &[Token], end: Location) -> Result<Expr, LocatedError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        end,
        depth: 0,
        binary_operators: 0,
    };
    let expr = parser.parse_binary(1)?;

    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(unexpected(token)),
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    end: Location,
    /// Open parentheses and unary operators around the current position
    depth: usize,
    binary_operators: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&'t Token, LocatedError> {
        let token = self.tokens.get(self.pos).ok_or_else(|| {
            LocatedError::new(PreprocessorError::UnexpectedNewLine, self.end)
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, Location)> {
        match self.peek()? {
            Token {
                value: TokenValue::Punct(punct),
                location,
                ..
            } => BinaryOp::from_punct(*punct).map(|op| (op, *location)),
            _ => None,
        }
    }

    fn enter(&mut self, location: Location) -> Result<(), LocatedError> {
        if self.depth >= MAX_NESTING {
            return Err(LocatedError::new(
                PreprocessorError::RecursionLimitReached,
                location,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Precedence climbing over left-associative operators.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, LocatedError> {
        let mut left = self.parse_unary()?;

        while let Some((op, location)) = self.peek_binary_op() {
            if op.precedence() < min_precedence {
                break;
            }
            if self.binary_operators >= MAX_BINARY_OPERATORS {
                return Err(LocatedError::new(
                    PreprocessorError::RecursionLimitReached,
                    location,
                ));
            }
            self.binary_operators += 1;
            self.pos += 1;
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, LocatedError> {
        let token = self.next()?;

        let op = match &token.value {
            TokenValue::Punct(Punct::Plus) => UnaryOp::Plus,
            TokenValue::Punct(Punct::Minus) => UnaryOp::Neg,
            TokenValue::Punct(Punct::Tilde) => UnaryOp::BitNot,
            TokenValue::Punct(Punct::Bang) => UnaryOp::Not,
            TokenValue::Punct(Punct::LeftParen) => {
                self.enter(token.location)?;
                let inner = self.parse_binary(1)?;
                self.depth -= 1;
                let close = self.next()?;
                if close.value != TokenValue::Punct(Punct::RightParen) {
                    return Err(unexpected(close));
                }
                return Ok(inner);
            }
            // Two's complement reinterpretation, as in C
            TokenValue::Integer(integer) => return Ok(Expr::Integer(integer.value as i64)),
            TokenValue::Ident(_) => {
                return Err(LocatedError::new(
                    PreprocessorError::MacroNotDefined,
                    token.location,
                ))
            }
            _ => return Err(unexpected(token)),
        };

        self.enter(token.location)?;
        let operand = self.parse_unary()?;
        self.depth -= 1;

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }
}

fn unexpected(token: &Token) -> LocatedError {
    let error = match token.value.clone().into_token_value() {
        Ok(value) => PreprocessorError::UnexpectedToken(value),
        Err(error) => error,
    };
    LocatedError::new(error, token.location)
}
