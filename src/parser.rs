/*!
Recursive‑descent parser: owned token sequence → [`Stmt`] list.

Every token is consumed at most once and recovery only moves forward, so a parse
is linear in the token count.  Stack depth follows syntactic nesting.

Syntax errors never abort the parse.  Errors that leave the parser lost
(`consume` failing) unwind to [`Parser::declaration`], which records the error
and skips to the next statement boundary.  Errors that do not (an invalid
assignment target, an over-long argument list) are recorded in place and the
parse carries on as if nothing happened.

Precedence, lowest first:

```text
assignment  → ( call "." )? IDENT "=" assignment | or
or          → and ( "or" and )*
and         → equality ( "and" equality )*
equality    → comparison ( ( "!=" | "==" ) comparison )*
comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )*
term        → factor ( ( "-" | "+" ) factor )*
factor      → unary ( ( "/" | "*" ) unary )*
unary       → ( "!" | "-" ) unary | call
call        → primary ( "(" arguments? ")" | "." IDENT )*
```

`for` loops have no node of their own; they are rewritten into `while`.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Upper bound on parameters and call arguments.
const MAX_ARGS: usize = 255;

type Rule<T> = fn(&mut Parser) -> Result<T>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<LoxError>,
}

impl Parser {
    /// A terminal `EOF` is appended if `tokens` lacks one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        let line = tokens.last().map_or(1, |t| t.line);
        if !matches!(tokens.last(), Some(t) if t.token_type == TokenType::EOF) {
            tokens.push(Token::new(TokenType::EOF, "", line));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a whole program.
    ///
    /// Returns the statements that parsed cleanly together with every syntax
    /// error met on the way.  The statements are only meaningful to run when
    /// the error list is empty.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<LoxError>) {
        info!("Beginning parse phase");

        let mut program = Vec::new();
        while !self.is_at_end() {
            program.extend(self.declaration());
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            program.len(),
            self.errors.len()
        );

        (program, self.errors)
    }

    // ──────────────────────── declarations ────────────────────────

    /// One declaration, or `None` after recording an error and resynchronizing.
    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        let parsed = match self.peek().token_type {
            TokenType::CLASS => {
                self.advance();
                self.class_declaration()
            }
            TokenType::FUN => {
                self.advance();
                self.function("function").map(Stmt::Function)
            }
            TokenType::VAR => {
                self.advance();
                self.var_declaration()
            }
            _ => self.statement(),
        };

        parsed
            .map_err(|e| {
                self.errors.push(e);
                self.synchronize();
            })
            .ok()
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        let mut superclass = None;
        if self.matches(TokenType::LESS) {
            let parent = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;
            superclass = Some(Expr::variable(parent));
        }

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        debug!("Parsed class '{}' with {} method(s)", name.lexeme, methods.len());

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// Named function after `fun`, or a method inside a class body.  `kind`
    /// only feeds the diagnostics.
    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name = self.consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;
        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let params = self.comma_list("parameters", |p| {
            p.consume(TokenType::IDENTIFIER, "Expect parameter name.")
        })?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;
        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after variable declaration.")?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statements ─────────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        let rule: Rule<Stmt> = match self.peek().token_type {
            TokenType::FOR => Self::for_statement,
            TokenType::IF => Self::if_statement,
            TokenType::PRINT => Self::print_statement,
            TokenType::RETURN => Self::return_statement,
            TokenType::WHILE => Self::while_statement,
            TokenType::LEFT_BRACE => |p| p.block().map(Stmt::Block),
            _ => return self.expression_statement(),
        };

        // Every rule above starts just past its leading keyword.
        self.advance();
        rule(self)
    }

    /// `for (init; cond; incr) body` becomes `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        debug!("Desugaring for loop at line {}", self.previous().line);

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = match self.peek().token_type {
            TokenType::SEMICOLON => {
                self.advance();
                None
            }
            TokenType::VAR => {
                self.advance();
                Some(self.var_declaration()?)
            }
            _ => Some(self.expression_statement()?),
        };

        let condition = self.optional_expression(TokenType::SEMICOLON)?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = self.optional_expression(TokenType::RIGHT_PAREN)?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let body = self.statement()?;
        let body = match increment {
            Some(increment) => Stmt::Block(vec![body, Stmt::Expression(increment)]),
            None => body,
        };

        let body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(LiteralValue::True)),
            body: Box::new(body),
        };

        Ok(match initializer {
            Some(initializer) => Stmt::Block(vec![initializer, body]),
            None => body,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let condition = self.parenthesized("if", "if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();
        let value = self.optional_expression(TokenType::SEMICOLON)?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let condition = self.parenthesized("while", "condition")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    /// Declarations up to the closing brace; the opening one is already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.extend(self.declaration());
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    /// `( expression )` after `keyword`.
    fn parenthesized(&mut self, keyword: &str, what: &str) -> Result<Expr> {
        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after '{}'.", keyword),
        )?;
        let expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, &format!("Expect ')' after {}.", what))?;

        Ok(expr)
    }

    /// An expression, unless the next token is `terminator`.
    fn optional_expression(&mut self, terminator: TokenType) -> Result<Option<Expr>> {
        if self.check(terminator) {
            Ok(None)
        } else {
            self.expression().map(Some)
        }
    }

    // ───────────────────────── expressions ────────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let target = self.or()?;

        if !self.matches(TokenType::EQUAL) {
            return Ok(target);
        }

        let equals = self.previous().clone();
        let value = Box::new(self.assignment()?);

        Ok(match target {
            Expr::Variable { name, .. } => Expr::Assign {
                id: ExprId::fresh(),
                name,
                value,
            },
            Expr::Get { object, name } => Expr::Set {
                object,
                name,
                value,
            },
            // Not fatal: keep the left-hand side and carry on.
            other => {
                self.error(&equals, "Invalid assignment target.");
                other
            }
        })
    }

    fn or(&mut self) -> Result<Expr> {
        self.logical_level(TokenType::OR, Self::and)
    }

    fn and(&mut self) -> Result<Expr> {
        self.logical_level(TokenType::AND, Self::equality)
    }

    /// One short-circuiting level; the operator is kept for the interpreter.
    fn logical_level(&mut self, operator: TokenType, operand: Rule<Expr>) -> Result<Expr> {
        let mut expr = operand(self)?;

        while self.check(operator.clone()) {
            let operator = self.advance().clone();
            let right = operand(self)?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// One left-associative binary precedence level.
    fn binary_level(&mut self, operators: &[TokenType], operand: Rule<Expr>) -> Result<Expr> {
        let mut expr = operand(self)?;

        while operators.iter().any(|op| self.check(op.clone())) {
            let operator = self.advance().clone();
            let right = operand(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if !(self.check(TokenType::BANG) || self.check(TokenType::MINUS)) {
            return self.call();
        }

        let operator = self.advance().clone();
        let right = Box::new(self.unary()?);

        Ok(Expr::Unary { operator, right })
    }

    /// Postfix chain: any mix of `(args)` and `.name` after a primary.
    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            expr = match self.peek().token_type {
                TokenType::LEFT_PAREN => {
                    self.advance();
                    self.finish_call(expr)?
                }
                TokenType::DOT => {
                    self.advance();
                    let name =
                        self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;
                    Expr::Get {
                        object: Box::new(expr),
                        name,
                    }
                }
                _ => return Ok(expr),
            };
        }
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let arguments = self.comma_list("arguments", Self::expression)?;
        let paren = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    /// Zero or more comma-separated `item`s before a `)`.  Going past
    /// [`MAX_ARGS`] is reported once per extra item but does not stop the parse.
    fn comma_list<T>(&mut self, what: &str, item: Rule<T>) -> Result<Vec<T>> {
        let mut items = Vec::new();

        if self.check(TokenType::RIGHT_PAREN) {
            return Ok(items);
        }

        loop {
            if items.len() >= MAX_ARGS {
                let at = self.peek().clone();
                self.error(&at, &format!("Can't have more than {} {}.", MAX_ARGS, what));
            }

            items.push(item(self)?);

            if !self.matches(TokenType::COMMA) {
                return Ok(items);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();

        let expr = match token.token_type {
            TokenType::FALSE => Expr::Literal(LiteralValue::False),
            TokenType::TRUE => Expr::Literal(LiteralValue::True),
            TokenType::NIL => Expr::Literal(LiteralValue::Nil),
            TokenType::NUMBER(n) => Expr::Literal(LiteralValue::Number(n)),
            TokenType::STRING(s) => Expr::Literal(LiteralValue::Str(s)),
            TokenType::IDENTIFIER => Expr::variable(token),
            TokenType::THIS => Expr::This {
                id: ExprId::fresh(),
                keyword: token,
            },

            TokenType::SUPER => {
                self.advance();
                self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
                let method = self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;
                return Ok(Expr::Super {
                    id: ExprId::fresh(),
                    keyword: token,
                    method,
                });
            }

            TokenType::LEFT_PAREN => {
                self.advance();
                let inner = self.expression()?;
                self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(inner)));
            }

            _ => return Err(LoxError::parse(&token, "Expect expression.")),
        };

        self.advance();
        Ok(expr)
    }

    // ─────────────────────────── helpers ──────────────────────────

    /// Record an error that leaves the parser in a known state.
    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::parse(token, message));
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        let hit = self.check(ttype);
        if hit {
            self.advance();
        }
        hit
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            Ok(self.advance().clone())
        } else {
            Err(LoxError::parse(self.peek(), message))
        }
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == ttype
    }

    /// Step forward (never past `EOF`) and return the token stepped over.
    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Skip ahead to a likely statement start: just past a `;`, or onto a
    /// keyword that opens a declaration or statement.
    fn synchronize(&mut self) {
        debug!("Synchronizing after syntax error at line {}", self.peek().line);

        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            if matches!(
                self.peek().token_type,
                TokenType::CLASS
                    | TokenType::FUN
                    | TokenType::VAR
                    | TokenType::FOR
                    | TokenType::IF
                    | TokenType::WHILE
                    | TokenType::PRINT
                    | TokenType::RETURN
            ) {
                return;
            }

            self.advance();
        }
    }
}
