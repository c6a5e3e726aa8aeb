//! Recursive-descent parser.

use std::rc::Rc;

use thiserror::Error;

use crate::ast::{BinaryOp, Expr, FunctionDecl, Program, Stmt, UnaryOp};
use crate::token::{Token, TokenKind};
use crate::value::Value;

#[derive(Debug, Error)]
#[error("Parse error at line {line}: {message}")]
struct ParseError {
    line: u32,
    message: String,
}

/// Build a `Program` from a token list.
///
/// A syntax error discards the statement being parsed, prints a diagnostic
/// to stderr and resumes at the next likely statement boundary, so a single
/// error does not hide the rest of the program.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser {
            tokens,
            current: 0,
            errors: 0,
        }
    }

    /// Parse the whole token list.  Returns `None` when errors occurred and
    /// no statement could be recovered.
    pub fn parse(&mut self) -> Option<Program> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if self.matches(&[TokenKind::Newline]) {
                continue;
            }
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    eprintln!("{}", e);
                    self.errors += 1;
                    self.synchronize();
                }
            }
        }

        if statements.is_empty() && self.errors > 0 {
            return None;
        }
        Some(Program { statements })
    }

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        if self.matches(&[TokenKind::Let]) {
            return self.let_declaration();
        }
        if self.matches(&[TokenKind::Fun]) {
            return self.function_declaration();
        }
        self.statement()
    }

    fn let_declaration(&mut self) -> Result<Stmt, ParseError> {
        if !self.check(TokenKind::Identifier) {
            return Err(self.error("Expected variable name"));
        }
        let name = self.advance().lexeme.clone();

        let initializer = if self.matches(&[TokenKind::Assign]) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        self.matches(&[TokenKind::Semicolon, TokenKind::Newline]);
        Ok(Stmt::Let(name, initializer))
    }

    fn function_declaration(&mut self) -> Result<Stmt, ParseError> {
        if !self.check(TokenKind::Identifier) {
            return Err(self.error("Expected function name"));
        }
        let name = self.advance().lexeme.clone();

        if !self.matches(&[TokenKind::LeftParen]) {
            return Err(self.error("Expected '(' after function name"));
        }
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if !self.check(TokenKind::Identifier) {
                    return Err(self.error("Expected parameter name"));
                }
                params.push(self.advance().lexeme.clone());
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        if !self.matches(&[TokenKind::RightParen]) {
            return Err(self.error("Expected ')' after parameters"));
        }

        if !self.matches(&[TokenKind::LeftBrace]) {
            return Err(self.error("Expected '{' before function body"));
        }
        let body = self.block_body()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.matches(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement();
        }
        if self.matches(&[TokenKind::Print]) {
            return self.print_statement();
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block_body()?));
        }
        self.expression_statement()
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        if !self.matches(&[TokenKind::LeftParen]) {
            return Err(self.error("Expected '(' after 'if'"));
        }
        let condition = self.expression()?;
        if !self.matches(&[TokenKind::RightParen]) {
            return Err(self.error("Expected ')' after if condition"));
        }

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(Box::new(condition), then_branch, else_branch))
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        if !self.matches(&[TokenKind::LeftParen]) {
            return Err(self.error("Expected '(' after 'while'"));
        }
        let condition = self.expression()?;
        if !self.matches(&[TokenKind::RightParen]) {
            return Err(self.error("Expected ')' after while condition"));
        }

        let body = self.statement()?;
        Ok(Stmt::While(Box::new(condition), Box::new(body)))
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = if self.check(TokenKind::Semicolon) || self.check(TokenKind::Newline) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.matches(&[TokenKind::Semicolon, TokenKind::Newline]);
        Ok(Stmt::Return(value))
    }

    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.matches(&[TokenKind::Semicolon, TokenKind::Newline]);
        Ok(Stmt::Print(Box::new(expr)))
    }

    /// Parse the statements of a block.  The opening brace has already been
    /// consumed; this consumes the closing one.
    fn block_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.matches(&[TokenKind::Newline]) {
                continue;
            }
            statements.push(self.declaration()?);
        }
        if !self.matches(&[TokenKind::RightBrace]) {
            return Err(self.error("Expected '}' after block"));
        }
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.matches(&[TokenKind::Semicolon, TokenKind::Newline]);
        Ok(Stmt::Expr(Box::new(expr)))
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.logical_or()?;

        if self.matches(&[TokenKind::Assign]) {
            let value = self.assignment()?;
            return match expr {
                Expr::Identifier(name) => Ok(Expr::Assign(name, Box::new(value))),
                _ => Err(self.error("Invalid assignment target")),
            };
        }
        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.logical_and()?;
        while self.matches(&[TokenKind::Or]) {
            let rhs = self.logical_and()?;
            expr = Expr::Binary(Box::new(expr), BinaryOp::Or, Box::new(rhs));
        }
        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;
        while self.matches(&[TokenKind::And]) {
            let rhs = self.equality()?;
            expr = Expr::Binary(Box::new(expr), BinaryOp::And, Box::new(rhs));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        while self.matches(&[TokenKind::Equal, TokenKind::NotEqual]) {
            let op = match self.previous().kind {
                TokenKind::Equal => BinaryOp::Equal,
                _ => BinaryOp::NotEqual,
            };
            let rhs = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        while self.matches(&[
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]) {
            let op = match self.previous().kind {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                _ => BinaryOp::GreaterEqual,
            };
            let rhs = self.term()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while self.matches(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = match self.previous().kind {
                TokenKind::Plus => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            let rhs = self.factor()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while self.matches(&[TokenKind::Multiply, TokenKind::Divide, TokenKind::Modulo]) {
            let op = match self.previous().kind {
                TokenKind::Multiply => BinaryOp::Mul,
                TokenKind::Divide => BinaryOp::Div,
                _ => BinaryOp::Mod,
            };
            let rhs = self.unary()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.matches(&[TokenKind::Not, TokenKind::Minus]) {
            let op = match self.previous().kind {
                TokenKind::Minus => UnaryOp::Neg,
                _ => UnaryOp::Not,
            };
            let operand = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(operand)));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while self.matches(&[TokenKind::LeftParen]) {
            let args = self.arguments()?;
            if !self.matches(&[TokenKind::RightParen]) {
                return Err(self.error("Expected ')' after arguments"));
            }
            expr = Expr::Call(Box::new(expr), args);
        }
        Ok(expr)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal(Value::Nil))
            }
            TokenKind::Number => {
                let token = self.advance();
                let line = token.line;
                let lexeme = token.lexeme.clone();
                match lexeme.parse::<f64>() {
                    Ok(n) => Ok(Expr::Literal(Value::Number(n))),
                    Err(_) => Err(ParseError {
                        line,
                        message: format!("Invalid number '{}'", lexeme),
                    }),
                }
            }
            TokenKind::String => {
                let lexeme = self.advance().lexeme.clone();
                Ok(Expr::Literal(Value::Str(lexeme.into())))
            }
            TokenKind::Identifier => {
                let name = self.advance().lexeme.clone();
                Ok(Expr::Identifier(name))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                if !self.matches(&[TokenKind::RightParen]) {
                    return Err(self.error("Expected ')' after expression"));
                }
                Ok(expr)
            }
            _ => Err(self.error("Expected expression")),
        }
    }

    /// Skip to the next likely statement boundary after a syntax error.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Fun
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Print => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.peek().line,
            message: message.into(),
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EndOfFile
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }
}
