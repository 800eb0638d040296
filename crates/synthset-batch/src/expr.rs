//! A closed-form numeric expression grammar.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := number | 'pi' | 'math.pi' | '(' expr ')'
//! ```

/// The deepest nesting of parentheses and unary signs an expression may use.
pub const MAX_DEPTH: usize = 64;

/// Error types for expression evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    /// A character outside the grammar.
    #[error("Unexpected character {ch:?} at {pos}")]
    UnexpectedChar {
        /// Byte offset in the expression.
        pos: usize,
        /// The offending character.
        ch: char,
    },

    /// The expression ended early.
    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    /// A token in the wrong place.
    #[error("Unexpected {found} at {pos}")]
    UnexpectedToken {
        /// Byte offset in the expression.
        pos: usize,
        /// A description of the token.
        found: String,
    },

    /// A name other than `pi`.
    #[error("Unknown identifier {0:?}")]
    UnknownIdentifier(String),

    /// A malformed numeric literal.
    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    /// Parentheses or signs nested deeper than [`MAX_DEPTH`].
    #[error("Expression nested deeper than {} at {pos}", MAX_DEPTH)]
    TooDeep {
        /// Byte offset in the expression.
        pos: usize,
    },

    /// The result is infinite or NaN, e.g. after a division by zero.
    #[error("Expression {0:?} is not finite")]
    NotFinite(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Pi,
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
            Token::Number(v) => format!("number {v}"),
            Token::Pi => "pi".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push((pos, token));
            pos += 1;
            continue;
        }

        if c.is_ascii_whitespace() {
            pos += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = pos;
            while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                pos += 1;
            }
            // exponent, e.g. 1e-3
            if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
                pos += 1;
                if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
                    pos += 1;
                }
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let literal = &input[start..pos];
            let value = literal
                .parse::<f64>()
                .map_err(|_| ExprError::InvalidNumber(literal.to_string()))?;
            tokens.push((start, Token::Number(value)));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < bytes.len()
                && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_' || bytes[pos] == b'.')
            {
                pos += 1;
            }
            match &input[start..pos] {
                "pi" | "math.pi" => tokens.push((start, Token::Pi)),
                name => return Err(ExprError::UnknownIdentifier(name.to_string())),
            }
        } else {
            let ch = input[pos..].chars().next().unwrap_or(c);
            return Err(ExprError::UnexpectedChar { pos, ch });
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    next: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next).map(|(_, t)| t)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.next).cloned();
        self.next += 1;
        token
    }

    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.advance();
                    value /= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // every recursive path of the grammar passes through here
    fn unary(&mut self) -> Result<f64, ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let pos = self.tokens.get(self.next).map_or(usize::MAX, |(pos, _)| *pos);
            return Err(ExprError::TooDeep { pos });
        }
        let value = match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.unary().map(|v| -v)
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.primary(),
        };
        self.depth -= 1;
        value
    }

    fn primary(&mut self) -> Result<f64, ExprError> {
        match self.advance() {
            Some((_, Token::Number(v))) => Ok(v),
            Some((_, Token::Pi)) => Ok(std::f64::consts::PI),
            Some((_, Token::LParen)) => {
                let value = self.expr()?;
                match self.advance() {
                    Some((_, Token::RParen)) => Ok(value),
                    Some((pos, token)) => Err(ExprError::UnexpectedToken {
                        pos,
                        found: token.describe(),
                    }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some((pos, token)) => Err(ExprError::UnexpectedToken {
                pos,
                found: token.describe(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

/// Evaluate a numeric expression such as `"3*pi/6"` or `"-(1 + 2) / 4"`.
///
/// Example:
///
/// ```
/// use synthset_batch::expr::evaluate;
///
/// assert_eq!(evaluate("2 * (1 + 2)")?, 6.0);
/// assert_eq!(evaluate("math.pi / 2")?, std::f64::consts::FRAC_PI_2);
/// # Ok::<(), synthset_batch::expr::ExprError>(())
/// ```
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        next: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some((pos, token)) = parser.advance() {
        return Err(ExprError::UnexpectedToken {
            pos,
            found: token.describe(),
        });
    }
    if !value.is_finite() {
        return Err(ExprError::NotFinite(input.to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_precedence() -> Result<(), ExprError> {
        assert_eq!(evaluate("1 + 2 * 3")?, 7.0);
        assert_eq!(evaluate("(1 + 2) * 3")?, 9.0);
        assert_eq!(evaluate("8 / 4 / 2")?, 1.0);
        assert_eq!(evaluate("10 - 4 - 3")?, 3.0);
        assert_eq!(evaluate("-2 * -3")?, 6.0);
        assert_eq!(evaluate("--1")?, 1.0);
        assert_eq!(evaluate("+.5")?, 0.5);
        assert_eq!(evaluate("1e-3 * 1E3")?, 1.0);
        Ok(())
    }

    #[test]
    fn test_pi() -> Result<(), ExprError> {
        assert_relative_eq!(evaluate("3*pi/6")?, PI / 2.0);
        assert_relative_eq!(evaluate("math.pi/4")?, PI / 4.0);
        assert_relative_eq!(evaluate(" -pi ")?, -PI);
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate(""), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate("1 +"), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate("(1 + 2"), Err(ExprError::UnexpectedEnd));
        assert_eq!(
            evaluate("1 2"),
            Err(ExprError::UnexpectedToken {
                pos: 2,
                found: "number 2".to_string()
            })
        );
        assert_eq!(
            evaluate("2 ** 3"),
            Err(ExprError::UnexpectedToken {
                pos: 3,
                found: "'*'".to_string()
            })
        );
        assert_eq!(
            evaluate("__import__('os')"),
            Err(ExprError::UnknownIdentifier("__import__".to_string()))
        );
        assert_eq!(
            evaluate("1 % 2"),
            Err(ExprError::UnexpectedChar { pos: 2, ch: '%' })
        );
        assert_eq!(evaluate("1..2"), Err(ExprError::InvalidNumber("1..2".to_string())));
        assert_eq!(evaluate("1/0"), Err(ExprError::NotFinite("1/0".to_string())));
    }

    #[test]
    fn test_nesting_limit() -> Result<(), ExprError> {
        let shallow = format!("{}1{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(evaluate(&shallow)?, 1.0);
        assert_eq!(evaluate(&format!("{}1", "-".repeat(MAX_DEPTH - 1)))?, -1.0);

        let deep = "(".repeat(10_000);
        assert!(matches!(evaluate(&deep), Err(ExprError::TooDeep { pos: MAX_DEPTH })));
        assert!(matches!(
            evaluate(&format!("{}1", "-".repeat(10_000))),
            Err(ExprError::TooDeep { .. })
        ));
        Ok(())
    }
}
