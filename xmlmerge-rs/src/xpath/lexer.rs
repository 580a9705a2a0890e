//! Selector lexer.
//!
//! Tokenizes XPath 1.0 expressions. `*` and the names `and`, `or`, `div` and
//! `mod` are operators only when they follow a token that can end an operand,
//! so `/html/div` and `/a/*` lex as name tests.

/// Selector token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Path punctuation
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Comma,       // ,

    // Operators
    Plus,     // +
    Minus,    // -
    Multiply, // * after an operand
    Eq,       // =
    NotEq,    // !=
    Lt,       // <
    LtEq,     // <=
    Gt,       // >
    GtEq,     // >=
    And,
    Or,
    Mod,
    Div,

    // Brackets
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    // Literals
    Number(f64),
    Literal(String),

    // Names
    Star,                   // * as a name test
    Name(String),           // NCName or prefix:local
    PrefixWildcard(String), // prefix:*
    NodeType(String),       // node, text, comment, processing-instruction
    FunctionName(String),
    Axis(String), // axis name, `::` consumed
}

impl Token {
    /// True if an operator may follow this token (it ends an operand).
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Dot
                | Token::DoubleDot
                | Token::RightParen
                | Token::RightBracket
                | Token::Number(_)
                | Token::Literal(_)
                | Token::Star
                | Token::Name(_)
                | Token::PrefixWildcard(_)
        )
    }
}

/// Selector lexer.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    previous: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            previous: None,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    fn operator_expected(&self) -> bool {
        self.previous.as_ref().is_some_and(Token::ends_operand)
    }

    /// Tokenize the entire input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            self.previous = Some(token.clone());
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, or `None` at the end of input.
    fn next_token(&mut self) -> Result<Option<Token>, String> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.peek_at(1) == Some('.') {
                    self.advance(2);
                    Token::DoubleDot
                } else if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.read_number()
                } else {
                    self.advance(1);
                    Token::Dot
                }
            }
            '@' => self.single(Token::At),
            '|' => self.single(Token::Pipe),
            ',' => self.single(Token::Comma),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '=' => self.single(Token::Eq),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            '*' => {
                if self.operator_expected() {
                    self.single(Token::Multiply)
                } else {
                    self.single(Token::Star)
                }
            }
            '!' => {
                if self.peek_at(1) == Some('=') {
                    self.advance(2);
                    Token::NotEq
                } else {
                    return Err(format!("unexpected character '!' at offset {}", self.pos));
                }
            }
            '<' => {
                if self.peek_at(1) == Some('=') {
                    self.advance(2);
                    Token::LtEq
                } else {
                    self.single(Token::Lt)
                }
            }
            '>' => {
                if self.peek_at(1) == Some('=') {
                    self.advance(2);
                    Token::GtEq
                } else {
                    self.single(Token::Gt)
                }
            }
            '"' | '\'' => self.read_literal(c)?,
            '0'..='9' => self.read_number(),
            '$' => return Err("variable references are not supported".to_string()),
            _ if is_name_start_char(c) => self.read_name()?,
            _ => {
                return Err(format!(
                    "unexpected character '{}' at offset {}",
                    c, self.pos
                ))
            }
        };
        Ok(Some(token))
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance(1);
        token
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        if self.peek() == Some('.') {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }
        let value = self.input[start..self.pos].parse().unwrap_or(f64::NAN);
        Token::Number(value)
    }

    fn read_literal(&mut self, quote: char) -> Result<Token, String> {
        let start = self.pos;
        self.advance(1);
        let body_start = self.pos;
        match self.remaining().find(quote) {
            Some(len) => {
                let value = self.input[body_start..body_start + len].to_string();
                self.advance(len + 1);
                Ok(Token::Literal(value))
            }
            None => Err(format!("unterminated string literal at offset {}", start)),
        }
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn read_name(&mut self) -> Result<Token, String> {
        let name = self.read_ncname();

        if self.operator_expected() {
            match name {
                "and" => return Ok(Token::And),
                "or" => return Ok(Token::Or),
                "mod" => return Ok(Token::Mod),
                "div" => return Ok(Token::Div),
                _ => {}
            }
        }

        // prefix:local or prefix:*
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            return match self.peek_at(1) {
                Some('*') => {
                    self.advance(2);
                    Ok(Token::PrefixWildcard(name.to_string()))
                }
                Some(c) if is_name_start_char(c) => {
                    self.advance(1);
                    let local = self.read_ncname();
                    Ok(Token::Name(format!("{}:{}", name, local)))
                }
                _ => Err(format!("malformed qualified name '{}:'", name)),
            };
        }

        let after_name = self.pos;
        self.skip_whitespace();
        if self.remaining().starts_with("::") {
            self.advance(2);
            return Ok(Token::Axis(name.to_string()));
        }
        if self.peek() == Some('(') {
            return Ok(match name {
                "node" | "text" | "comment" | "processing-instruction" => {
                    Token::NodeType(name.to_string())
                }
                _ => Token::FunctionName(name.to_string()),
            });
        }
        self.pos = after_name;
        Ok(Token::Name(name.to_string()))
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == '\u{B7}'
}

/// Tokenizes a selector expression.
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    Lexer::new(input).tokenize()
}
