//! Recursive-descent parser.
//!
//! Precedence, loosest first: `||`, `&&`, `== !=`, `< <= > >= %% %^`,
//! `+ -`, `* / %`, prefix `! -`.

use crate::ast::{BinaryOp, Expr, Function, Literal, UnaryOp};
use crate::error::ExprError;
use crate::lexer::{Spanned, Token, tokenize};

/// Parse a filter expression.
///
/// # Errors
///
/// Returns the first lexical or syntactic error.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        position: 0,
    };
    let expr = parser.or()?;
    if let Some(extra) = parser.peek() {
        return Err(ExprError::UnexpectedToken {
            offset: extra.offset,
            found: extra.token.to_string(),
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    position: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&Spanned> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().is_some_and(|spanned| &spanned.token == expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExprError> {
        match self.advance() {
            Some(spanned) if &spanned.token == expected => Ok(()),
            Some(spanned) => Err(ExprError::UnexpectedToken {
                offset: spanned.offset,
                found: spanned.token.to_string(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn binary_level(
        &mut self,
        operators: &[(Token, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ExprError>,
    ) -> Result<Expr, ExprError> {
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in operators {
                if self.eat(token) {
                    let right = next(self)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        self.binary_level(&[(Token::Or, BinaryOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        self.binary_level(&[(Token::And, BinaryOp::And)], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, ExprError> {
        self.binary_level(
            &[(Token::Eq, BinaryOp::Eq), (Token::Ne, BinaryOp::Ne)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        self.binary_level(
            &[
                (Token::Le, BinaryOp::Le),
                (Token::Lt, BinaryOp::Lt),
                (Token::Ge, BinaryOp::Ge),
                (Token::Gt, BinaryOp::Gt),
                (Token::Glob, BinaryOp::Glob),
                (Token::PrefixI, BinaryOp::PrefixI),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        self.binary_level(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        self.binary_level(
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let Some(spanned) = self.advance().cloned() else {
            return Err(ExprError::UnexpectedEnd);
        };
        match spanned.token {
            Token::Number(value) => Ok(Expr::Literal(Literal::Number(value))),
            Token::Str(text) => Ok(Expr::Literal(Literal::Str(text))),
            Token::True => Ok(Expr::Literal(Literal::Bool(true))),
            Token::False => Ok(Expr::Literal(Literal::Bool(false))),
            Token::LParen => {
                let inner = self.or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if self.eat(&Token::LParen) => self.call(name),
            Token::Ident(name) => Ok(Expr::Var(name)),
            other => Err(ExprError::UnexpectedToken {
                offset: spanned.offset,
                found: other.to_string(),
            }),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, ExprError> {
        let function = Function::lookup(&name).ok_or(ExprError::UnknownFunction { name })?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.or()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen)?;
                break;
            }
        }
        if args.len() != function.arity() {
            return Err(ExprError::Arity {
                name: function.name(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        Ok(Expr::Call(function, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    #[test]
    fn default_match_expression_parses() -> Result<(), ExprError> {
        let expr = parse(
            "id == identifier || name %% identifier || (strlen(identifier) >= 5 && hashString %^ identifier)",
        )?;
        let Expr::Binary(BinaryOp::Or, left, right) = expr else {
            panic!("top level is an or");
        };
        assert!(matches!(*left, Expr::Binary(BinaryOp::Or, _, _)));
        assert!(matches!(*right, Expr::Binary(BinaryOp::And, _, _)));
        Ok(())
    }

    #[test]
    fn arithmetic_binds_tighter_than_comparison() -> Result<(), ExprError> {
        assert_eq!(
            parse("a + b * 2 > 1kB")?,
            Expr::Binary(
                BinaryOp::Gt,
                Box::new(Expr::Binary(
                    BinaryOp::Add,
                    var("a"),
                    Box::new(Expr::Binary(
                        BinaryOp::Mul,
                        var("b"),
                        Box::new(Expr::Literal(Literal::Number(2.0)))
                    )),
                )),
                Box::new(Expr::Literal(Literal::Number(1000.0))),
            )
        );
        Ok(())
    }

    #[test]
    fn syntax_errors_are_positioned() {
        assert!(matches!(
            parse("name %%"),
            Err(ExprError::UnexpectedEnd)
        ));
        assert!(matches!(
            parse("a b"),
            Err(ExprError::UnexpectedToken { offset: 2, .. })
        ));
        assert!(matches!(
            parse("strlen(a, b)"),
            Err(ExprError::Arity { expected: 1, found: 2, .. })
        ));
        assert!(matches!(
            parse("upper(a)"),
            Err(ExprError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn fields_exclude_identifier() -> Result<(), ExprError> {
        let fields = parse("name %% identifier && totalSize > 1GiB")?.fields();
        assert_eq!(
            fields.into_iter().collect::<Vec<_>>(),
            vec!["name".to_string(), "totalSize".to_string()]
        );
        Ok(())
    }
}
