//! A module implementing lexical analysis (tokenization) for the campfire scripting language.

use std::fmt;
use thiserror::Error;

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    And,
    Or,
    Not,
    In,
    True,
    False,
    None,
    Del,
    Pass,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "in" => Keyword::In,
            "True" => Keyword::True,
            "False" => Keyword::False,
            "None" => Keyword::None,
            "del" => Keyword::Del,
            "pass" => Keyword::Pass,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::In => "in",
            Keyword::True => "True",
            Keyword::False => "False",
            Keyword::None => "None",
            Keyword::Del => "del",
            Keyword::Pass => "pass",
        }
    }
}

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An integer literal, e.g. `42`.
    Int(i64),
    /// A floating point literal, e.g. `1.5` or `2e3`.
    Float(f64),
    /// A string literal with escapes already resolved.
    Str(String),
    /// An identifier that is not a keyword.
    Ident(String),
    /// A reserved word.
    Keyword(Keyword),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    /// The assignment symbol, `=`.
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    /// Statement separator, `;`.
    Semicolon,
    /// Statement separator. Not produced inside brackets.
    Newline,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Token::Int(i) => return write!(f, "{}", i),
            Token::Float(x) => return write!(f, "{:?}", x),
            Token::Str(s) => return write!(f, "{:?}", s),
            Token::Ident(name) => return write!(f, "{}", name),
            Token::Keyword(k) => k.as_str(),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::DoubleStar => "**",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::Assign => "=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::StarAssign => "*=",
            Token::SlashAssign => "/=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Less => "<",
            Token::LessEq => "<=",
            Token::Greater => ">",
            Token::GreaterEq => ">=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Semicolon => ";",
            Token::Newline => "newline",
        };
        f.write_str(symbol)
    }
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// A closing quote was not found before the end of the line.
    #[error("unterminated string literal")]
    UnfinishedString,
    /// A character that does not start any token.
    #[error("invalid character '{0}'")]
    UnexpectedChar(char),
    /// Digits that do not form a valid int or float.
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    /// A closing bracket without a matching opening one.
    #[error("unmatched '{0}'")]
    UnmatchedBracket(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingNumber,
    ReadingIdent,
    ReadingString(char), // opening quote
    ReadingEscape(char), // opening quote
    ReadingComment,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    depth: usize, // bracket nesting depth
}

impl LexingFSM {
    fn new(source: &str) -> Self {
        LexingFSM {
            input: source.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            depth: 0,
        }
    }

    /// Runs the state machine over the whole input.
    ///
    /// Newlines inside `(...)` or `[...]` are treated as plain whitespace so that
    /// long list literals and calls can span several lines of a script.
    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out)?,
                LexingState::ReadingNumber => self.handle_number(ch, &mut out)?,
                LexingState::ReadingIdent => self.handle_ident(ch, &mut out)?,
                LexingState::ReadingString(quote) => self.handle_string(ch, quote, &mut out)?,
                LexingState::ReadingEscape(quote) => self.handle_escape(ch, quote),
                LexingState::ReadingComment => self.handle_comment(ch, &mut out)?,
            }
        }

        // If something remains
        match self.state {
            LexingState::ReadingString(_) | LexingState::ReadingEscape(_) => {
                return Err(LexingError::UnfinishedString);
            }
            LexingState::ReadingNumber => self.finish_number(&mut out)?,
            LexingState::ReadingIdent => self.finish_ident(&mut out),
            _ => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    /// Consumes the next char if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' | '\r' => {}
            '\n' => {
                if self.depth == 0 {
                    out.push(Token::Newline);
                }
            }
            '#' => self.state = LexingState::ReadingComment,
            '\'' | '"' => self.state = LexingState::ReadingString(ch),
            c if c.is_ascii_digit() => {
                self.buffer.push(c);
                self.state = LexingState::ReadingNumber;
            }
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.buffer.push('.');
                self.state = LexingState::ReadingNumber;
            }
            c if c.is_alphabetic() || c == '_' => {
                self.buffer.push(c);
                self.state = LexingState::ReadingIdent;
            }
            '+' => out.push(self.with_assign(Token::Plus, Token::PlusAssign)),
            '-' => out.push(self.with_assign(Token::Minus, Token::MinusAssign)),
            '*' => {
                if self.eat('*') {
                    out.push(Token::DoubleStar);
                } else {
                    out.push(self.with_assign(Token::Star, Token::StarAssign));
                }
            }
            '/' => {
                if self.eat('/') {
                    out.push(Token::DoubleSlash);
                } else {
                    out.push(self.with_assign(Token::Slash, Token::SlashAssign));
                }
            }
            '%' => out.push(Token::Percent),
            '=' => out.push(self.with_assign(Token::Assign, Token::EqEq)),
            '!' => {
                if self.eat('=') {
                    out.push(Token::NotEq);
                } else {
                    return Err(LexingError::UnexpectedChar('!'));
                }
            }
            '<' => out.push(self.with_assign(Token::Less, Token::LessEq)),
            '>' => out.push(self.with_assign(Token::Greater, Token::GreaterEq)),
            '(' => {
                self.depth += 1;
                out.push(Token::LParen);
            }
            '[' => {
                self.depth += 1;
                out.push(Token::LBracket);
            }
            ')' | ']' => {
                self.depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or(LexingError::UnmatchedBracket(ch))?;
                out.push(if ch == ')' {
                    Token::RParen
                } else {
                    Token::RBracket
                });
            }
            ',' => out.push(Token::Comma),
            '.' => out.push(Token::Dot),
            ';' => out.push(Token::Semicolon),
            c => return Err(LexingError::UnexpectedChar(c)),
        }
        Ok(())
    }

    /// Picks `with_eq` when the operator is immediately followed by `=`.
    fn with_assign(&mut self, plain: Token, with_eq: Token) -> Token {
        if self.eat('=') { with_eq } else { plain }
    }

    fn handle_number(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        let has_exponent = self.buffer.contains(['e', 'E']);
        match ch {
            c if c.is_ascii_digit() => self.buffer.push(c),
            '_' => {}
            '.' if !self.buffer.contains('.') && !has_exponent => self.buffer.push('.'),
            'e' | 'E' if !has_exponent => {
                self.buffer.push(ch);
                if let Some(sign @ ('+' | '-')) = self.peek_char() {
                    self.read_char();
                    self.buffer.push(sign);
                }
            }
            c => {
                self.finish_number(out)?;
                self.handle_start(c, out)?;
            }
        }
        Ok(())
    }

    fn finish_number(&mut self, out: &mut Vec<Token>) -> Result<(), LexingError> {
        let text = std::mem::take(&mut self.buffer);
        self.state = LexingState::Start;
        let token = if text.contains(['.', 'e', 'E']) {
            match text.parse::<f64>() {
                Ok(x) => Token::Float(x),
                Err(_) => return Err(LexingError::InvalidNumber(text)),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => Token::Int(i),
                Err(_) => return Err(LexingError::InvalidNumber(text)),
            }
        };
        out.push(token);
        Ok(())
    }

    fn handle_ident(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        if ch.is_alphanumeric() || ch == '_' {
            self.buffer.push(ch);
            Ok(())
        } else {
            self.finish_ident(out);
            self.handle_start(ch, out)
        }
    }

    fn finish_ident(&mut self, out: &mut Vec<Token>) {
        let ident = std::mem::take(&mut self.buffer);
        self.state = LexingState::Start;
        out.push(match Keyword::from_ident(&ident) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(ident),
        });
    }

    fn handle_string(
        &mut self,
        ch: char,
        quote: char,
        out: &mut Vec<Token>,
    ) -> Result<(), LexingError> {
        match ch {
            c if c == quote => {
                out.push(Token::Str(std::mem::take(&mut self.buffer)));
                self.state = LexingState::Start;
            }
            '\\' => self.state = LexingState::ReadingEscape(quote),
            '\n' => return Err(LexingError::UnfinishedString),
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_escape(&mut self, ch: char, quote: char) {
        match ch {
            'n' => self.buffer.push('\n'),
            't' => self.buffer.push('\t'),
            'r' => self.buffer.push('\r'),
            '0' => self.buffer.push('\0'),
            '\\' | '\'' | '"' => self.buffer.push(ch),
            // unknown escapes are kept verbatim
            c => {
                self.buffer.push('\\');
                self.buffer.push(c);
            }
        }
        self.state = LexingState::ReadingString(quote);
    }

    fn handle_comment(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        if ch == '\n' {
            self.state = LexingState::Start;
            self.handle_start(ch, out)?;
        }
        Ok(())
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Creates and runs the finite state machine over `source`, which may hold a
/// single submission or a whole script.
pub fn split_into_tokens(source: &str) -> Result<Vec<Token>, LexingError> {
    let mut lexer = LexingFSM::new(source);
    lexer.make_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Token {
        Token::Ident(s.to_string())
    }

    #[test]
    fn test_assignment_and_arithmetic() {
        let tokens = split_into_tokens("x = 2 + 3*4").unwrap();
        assert_eq!(
            tokens,
            vec![
                ident("x"),
                Token::Assign,
                Token::Int(2),
                Token::Plus,
                Token::Int(3),
                Token::Star,
                Token::Int(4),
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        let tokens = split_into_tokens("a ** b // c == d != e <= f >= g += h").unwrap();
        let ops: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Ident(_)))
            .collect();
        assert_eq!(
            ops,
            vec![
                Token::DoubleStar,
                Token::DoubleSlash,
                Token::EqEq,
                Token::NotEq,
                Token::LessEq,
                Token::GreaterEq,
                Token::PlusAssign,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(split_into_tokens("42").unwrap(), vec![Token::Int(42)]);
        assert_eq!(split_into_tokens("1.5").unwrap(), vec![Token::Float(1.5)]);
        assert_eq!(split_into_tokens("2.").unwrap(), vec![Token::Float(2.0)]);
        assert_eq!(split_into_tokens(".5").unwrap(), vec![Token::Float(0.5)]);
        assert_eq!(split_into_tokens("1e3").unwrap(), vec![Token::Float(1000.0)]);
        assert_eq!(split_into_tokens("1_000").unwrap(), vec![Token::Int(1000)]);
    }

    #[test]
    fn test_integer_too_large() {
        assert_eq!(
            split_into_tokens("99999999999999999999"),
            Err(LexingError::InvalidNumber("99999999999999999999".to_string()))
        );
    }

    #[test]
    fn test_strings_with_escapes() {
        let tokens = split_into_tokens(r#"'it\'s' "a\tb\n""#).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Str("it's".to_string()), Token::Str("a\tb\n".to_string())]
        );
    }

    #[test]
    fn test_unfinished_string() {
        assert_eq!(split_into_tokens("'abc"), Err(LexingError::UnfinishedString));
        assert_eq!(split_into_tokens("'abc\n'"), Err(LexingError::UnfinishedString));
    }

    #[test]
    fn test_keywords() {
        let tokens = split_into_tokens("not True and None or x in y").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Not),
                Token::Keyword(Keyword::True),
                Token::Keyword(Keyword::And),
                Token::Keyword(Keyword::None),
                Token::Keyword(Keyword::Or),
                ident("x"),
                Token::Keyword(Keyword::In),
                ident("y"),
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = split_into_tokens("a = 1 # first\nb = 2").unwrap();
        assert_eq!(
            tokens,
            vec![
                ident("a"),
                Token::Assign,
                Token::Int(1),
                Token::Newline,
                ident("b"),
                Token::Assign,
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn test_newlines_inside_brackets_are_ignored() {
        let tokens = split_into_tokens("[1,\n 2]").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LBracket,
                Token::Int(1),
                Token::Comma,
                Token::Int(2),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_unmatched_bracket() {
        assert_eq!(split_into_tokens("1)"), Err(LexingError::UnmatchedBracket(')')));
    }

    #[test]
    fn test_unexpected_char() {
        assert_eq!(split_into_tokens("a $ b"), Err(LexingError::UnexpectedChar('$')));
    }

    #[test]
    fn test_attribute_access() {
        let tokens = split_into_tokens("history[-1].code").unwrap();
        assert_eq!(
            tokens,
            vec![
                ident("history"),
                Token::LBracket,
                Token::Minus,
                Token::Int(1),
                Token::RBracket,
                Token::Dot,
                ident("code"),
            ]
        );
    }
}
