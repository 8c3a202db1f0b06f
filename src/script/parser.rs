use crate::script::lexer::{Keyword, Token};
use thiserror::Error;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

/// Arithmetic operators, shared by binary expressions and augmented assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Expression node of the AST.
///
/// Every submission that parses as a single `Expr` is evaluated for its value;
/// anything else goes through [`Stmt`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLit,
    /// A variable reference resolved against the namespace, then the builtins.
    Name(String),
    /// A list display, `[a, b, c]`.
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A comparison chain. `a < b < c` holds `first = a` and two `rest` entries.
    Compare {
        first: Box<Expr>,
        rest: Vec<(CompareOp, Expr)>,
    },
    /// Short-circuit `and` / `or`.
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Attribute {
        target: Box<Expr>,
        name: String,
    },
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(String),
    Index { target: Expr, index: Expr },
}

/// Statement node of the AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// An expression evaluated for its side effects; the value is dropped.
    Expr(Expr),
    Assign {
        target: Target,
        value: Expr,
    },
    /// `target op= value`
    AugAssign {
        target: Target,
        op: BinaryOp,
        value: Expr,
    },
    /// `del name`
    Delete(String),
    Pass,
}

/// Errors that can occur during the AST construction (parsing) phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParsingError {
    /// Encountered a token that was not expected at the current position according to the grammar.
    #[error("invalid syntax: unexpected '{0}'")]
    UnexpectedToken(Token),
    /// Reached the end of the token stream prematurely, indicating an incomplete expression.
    #[error("invalid syntax: unexpected end of input")]
    UnexpectedEnd,
    /// The left-hand side of `=` is neither a name nor a subscript.
    #[error("cannot assign to expression")]
    InvalidAssignment,
    /// `del` must be followed by a name.
    #[error("invalid syntax: expected a name after 'del'")]
    ExpectedName,
    /// Brackets or prefix operators nested deeper than [`MAX_NESTING`].
    #[error("too many nested parentheses or operators")]
    TooDeep,
}

/// How deep brackets and prefix operators may nest in one submission.
pub const MAX_NESTING: usize = 100;

struct AstBuilder {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl AstBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        AstBuilder {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Runs one level of recursive descent, failing once the nesting bound is hit.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParsingError>,
    ) -> Result<T, ParsingError> {
        if self.depth >= MAX_NESTING {
            return Err(ParsingError::TooDeep);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn build_expression(mut self) -> Result<Expr, ParsingError> {
        let expr = self.parse_expression()?;

        while let Some(Token::Newline) = self.peek() {
            self.consume();
        }

        // Ensure we consumed all tokens
        if let Some(token) = self.consume() {
            return Err(ParsingError::UnexpectedToken(token));
        }

        Ok(expr)
    }

    fn build_program(mut self) -> Result<Vec<Stmt>, ParsingError> {
        let mut program = Vec::new();

        loop {
            self.skip_separators();
            if self.peek().is_none() {
                break;
            }

            program.push(self.parse_statement()?);

            match self.peek() {
                None | Some(Token::Newline) | Some(Token::Semicolon) => {}
                Some(token) => return Err(ParsingError::UnexpectedToken(token.clone())),
            }
        }

        Ok(program)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Helper to look ahead n tokens
    fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParsingError> {
        match self.consume() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ParsingError::UnexpectedToken(token)),
            None => Err(ParsingError::UnexpectedEnd),
        }
    }

    fn skip_separators(&mut self) {
        while let Some(Token::Newline | Token::Semicolon) = self.peek() {
            self.consume();
        }
    }

    /// Parse a statement: 'pass' | 'del' NAME | target assign-op expr | expr
    fn parse_statement(&mut self) -> Result<Stmt, ParsingError> {
        match self.peek() {
            Some(Token::Keyword(Keyword::Pass)) => {
                self.consume();
                return Ok(Stmt::Pass);
            }
            Some(Token::Keyword(Keyword::Del)) => {
                self.consume();
                return match self.consume() {
                    Some(Token::Ident(name)) => Ok(Stmt::Delete(name)),
                    _ => Err(ParsingError::ExpectedName),
                };
            }
            _ => {}
        }

        let expr = self.parse_expression()?;

        let op = match self.peek() {
            Some(Token::Assign) => None,
            Some(Token::PlusAssign) => Some(BinaryOp::Add),
            Some(Token::MinusAssign) => Some(BinaryOp::Sub),
            Some(Token::StarAssign) => Some(BinaryOp::Mul),
            Some(Token::SlashAssign) => Some(BinaryOp::Div),
            _ => return Ok(Stmt::Expr(expr)),
        };
        self.consume(); // consume the assignment operator

        let target = Self::into_target(expr)?;
        let value = self.parse_expression()?;

        Ok(match op {
            None => Stmt::Assign { target, value },
            Some(op) => Stmt::AugAssign { target, op, value },
        })
    }

    fn into_target(expr: Expr) -> Result<Target, ParsingError> {
        match expr {
            Expr::Name(name) => Ok(Target::Name(name)),
            Expr::Index { target, index } => Ok(Target::Index {
                target: *target,
                index: *index,
            }),
            _ => Err(ParsingError::InvalidAssignment),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, ParsingError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, ParsingError> {
        let mut lhs = self.parse_and()?;
        while let Some(Token::Keyword(Keyword::Or)) = self.peek() {
            self.consume();
            let rhs = self.parse_and()?;
            lhs = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParsingError> {
        let mut lhs = self.parse_not()?;
        while let Some(Token::Keyword(Keyword::And)) = self.peek() {
            self.consume();
            let rhs = self.parse_not()?;
            lhs = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ParsingError> {
        if let Some(Token::Keyword(Keyword::Not)) = self.peek() {
            self.consume();
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// Parse a comparison chain: additive (compop additive)*
    fn parse_comparison(&mut self) -> Result<Expr, ParsingError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();

        while let Some(op) = self.compare_op() {
            rest.push((op, self.parse_additive()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    /// Consumes a comparison operator if one is next.
    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek()? {
            Token::EqEq => CompareOp::Eq,
            Token::NotEq => CompareOp::NotEq,
            Token::Less => CompareOp::Lt,
            Token::LessEq => CompareOp::LtEq,
            Token::Greater => CompareOp::Gt,
            Token::GreaterEq => CompareOp::GtEq,
            Token::Keyword(Keyword::In) => CompareOp::In,
            Token::Keyword(Keyword::Not)
                if matches!(self.peek_n(1), Some(Token::Keyword(Keyword::In))) =>
            {
                self.consume(); // consume 'not'
                CompareOp::NotIn
            }
            _ => return None,
        };
        self.consume();
        Some(op)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParsingError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParsingError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.consume();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParsingError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.consume();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `**` binds tighter than a unary minus on its left and is right-associative,
    /// so `-2 ** 2` is `-(2 ** 2)` and `2 ** -1` is allowed.
    fn parse_power(&mut self) -> Result<Expr, ParsingError> {
        let base = self.parse_postfix()?;
        if let Some(Token::DoubleStar) = self.peek() {
            self.consume();
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    /// Parse calls, subscripts and attribute access following an atom.
    fn parse_postfix(&mut self) -> Result<Expr, ParsingError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.consume();
                    let args = self.parse_sequence(Token::RParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.consume();
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(Token::Dot) => {
                    self.consume();
                    let name = match self.consume() {
                        Some(Token::Ident(name)) => name,
                        Some(token) => return Err(ParsingError::UnexpectedToken(token)),
                        None => return Err(ParsingError::UnexpectedEnd),
                    };
                    expr = Expr::Attribute {
                        target: Box::new(expr),
                        name,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParsingError> {
        match self.consume() {
            Some(Token::Int(i)) => Ok(Expr::Int(i)),
            Some(Token::Float(x)) => Ok(Expr::Float(x)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => Ok(Expr::Name(name)),
            Some(Token::Keyword(Keyword::True)) => Ok(Expr::Bool(true)),
            Some(Token::Keyword(Keyword::False)) => Ok(Expr::Bool(false)),
            Some(Token::Keyword(Keyword::None)) => Ok(Expr::NoneLit),
            Some(Token::LParen) => {
                let inner = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => Ok(Expr::List(self.parse_sequence(Token::RBracket)?)),
            Some(token) => Err(ParsingError::UnexpectedToken(token)),
            None => Err(ParsingError::UnexpectedEnd),
        }
    }

    /// Parse comma-separated expressions up to and including `close`.
    /// A trailing comma is allowed.
    fn parse_sequence(&mut self, close: Token) -> Result<Vec<Expr>, ParsingError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.consume();
                return Ok(items);
            }
            items.push(self.parse_expression()?);
            match self.consume() {
                Some(Token::Comma) => {}
                Some(token) if token == close => return Ok(items),
                Some(token) => return Err(ParsingError::UnexpectedToken(token)),
                None => return Err(ParsingError::UnexpectedEnd),
            }
        }
    }
}

/// Parse the whole token stream as exactly one expression.
///
/// Fails if anything but trailing newlines follows the expression; the caller
/// uses that failure to fall back to [`construct_program`].
pub fn construct_expression(tokens: Vec<Token>) -> Result<Expr, ParsingError> {
    AstBuilder::from(tokens).build_expression()
}

/// Parse the token stream as a sequence of statements.
pub fn construct_program(tokens: Vec<Token>) -> Result<Vec<Stmt>, ParsingError> {
    AstBuilder::from(tokens).build_program()
}
