//! Lexical analyzer.

use crate::token::{Token, TokenKind};

const KEYWORDS: [(&str, TokenKind); 14] = [
    ("let", TokenKind::Let),
    ("fun", TokenKind::Fun),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("for", TokenKind::For),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("nil", TokenKind::Nil),
    ("return", TokenKind::Return),
    ("print", TokenKind::Print),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("not", TokenKind::Not),
];

fn keyword(lexeme: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(name, _)| *name == lexeme)
        .map(|&(_, kind)| kind)
}

/// Turn a source string into a sequence of tokens.
///
/// Malformed input never aborts scanning: an unexpected character is
/// reported on stderr and skipped, an unterminated string is reported and
/// dropped.  The output always ends with a single `EndOfFile` token.
pub struct Lexer {
    chars: Vec<char>,
    current: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            chars: source.chars().collect(),
            current: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else { break };

            if c == '/' && self.peek_next() == Some('/') {
                self.skip_comment();
                continue;
            }

            if let Some(token) = self.scan_token(c) {
                if token.kind != TokenKind::Invalid {
                    tokens.push(token);
                }
            }
        }
        tokens.push(Token::new(TokenKind::EndOfFile, "", self.line, self.column));
        tokens
    }

    /// Scan the token starting at `c`.  Returns `None` when the character
    /// does not begin any token.
    fn scan_token(&mut self, c: char) -> Option<Token> {
        match c {
            '(' => Some(self.single(TokenKind::LeftParen, "(")),
            ')' => Some(self.single(TokenKind::RightParen, ")")),
            '{' => Some(self.single(TokenKind::LeftBrace, "{")),
            '}' => Some(self.single(TokenKind::RightBrace, "}")),
            ',' => Some(self.single(TokenKind::Comma, ",")),
            ';' => Some(self.single(TokenKind::Semicolon, ";")),
            '+' => Some(self.single(TokenKind::Plus, "+")),
            '-' => Some(self.single(TokenKind::Minus, "-")),
            '*' => Some(self.single(TokenKind::Multiply, "*")),
            '/' => Some(self.single(TokenKind::Divide, "/")),
            '%' => Some(self.single(TokenKind::Modulo, "%")),
            '\n' => {
                let token = Token::new(TokenKind::Newline, "\\n", self.line, self.column);
                self.advance();
                self.line += 1;
                self.column = 1;
                Some(token)
            }
            '=' => Some(self.one_or_two(TokenKind::Assign, "=", TokenKind::Equal, "==")),
            '!' => Some(self.one_or_two(TokenKind::Not, "!", TokenKind::NotEqual, "!=")),
            '<' => Some(self.one_or_two(TokenKind::Less, "<", TokenKind::LessEqual, "<=")),
            '>' => Some(self.one_or_two(TokenKind::Greater, ">", TokenKind::GreaterEqual, ">=")),
            '"' => Some(self.scan_string()),
            '0'..='9' => Some(self.scan_number()),
            c if c.is_ascii_alphabetic() || c == '_' => Some(self.scan_identifier()),
            _ => {
                eprintln!("Unexpected character: {} at line {}", c, self.line);
                self.advance();
                None
            }
        }
    }

    fn single(&mut self, kind: TokenKind, lexeme: &str) -> Token {
        let token = Token::new(kind, lexeme, self.line, self.column);
        self.advance();
        token
    }

    /// Scan an operator that may be followed by `=` to form a two-character
    /// operator, falling back to the single-character form otherwise.
    fn one_or_two(
        &mut self,
        short: TokenKind,
        short_lexeme: &str,
        long: TokenKind,
        long_lexeme: &str,
    ) -> Token {
        let line = self.line;
        let column = self.column;
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            Token::new(long, long_lexeme, line, column)
        } else {
            Token::new(short, short_lexeme, line, column)
        }
    }

    fn scan_number(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // The lexeme may contain several dots; numeric conversion in the
        // parser rejects such forms.
        Token::new(TokenKind::Number, lexeme, line, column)
    }

    fn scan_string(&mut self) -> Token {
        let column = self.column;
        self.advance(); // opening quote

        let mut contents = String::new();
        loop {
            match self.peek() {
                None => {
                    eprintln!("Unterminated string at line {}", self.line);
                    return Token::new(TokenKind::Invalid, contents, self.line, column);
                }
                Some('"') => {
                    self.advance();
                    return Token::new(TokenKind::String, contents, self.line, column);
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                        self.column = 1;
                    }
                    contents.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = keyword(&lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, line, column)
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r') = self.peek() {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.current).copied();
        if c.is_some() {
            self.current += 1;
            self.column += 1;
        }
        c
    }
}
