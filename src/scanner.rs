//! Single-pass lexer over UTF-8 source text.
//!
//! [`Scanner`] is an iterator of `Result<Token>`: a lexical error is yielded in
//! place of the offending lexeme and scanning carries on, so one pass reports
//! every problem.  Exactly one `EOF` token ends the stream, after which the
//! iterator is fused.
//!
//! Lexing works on bytes.  Every token boundary the scanner stops at is an
//! ASCII byte, so slicing the source at those offsets is always valid; the
//! one place a non-ASCII character is seen (an unexpected character) steps
//! over its whole code point.

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    src: &'a str,
    start: usize,    // first byte of the current lexeme
    curr: usize,     // one past the last byte examined
    line: usize,     // 1-based
    finished: bool,  // EOF already yielded
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            finished: false,
        }
    }

    /// Drain the scanner, splitting tokens from lexical errors.
    pub fn scan_all(self) -> (Vec<Token>, Vec<LoxError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        debug!("scan_all: {} token(s), {} error(s)", tokens.len(), errors.len());

        (tokens, errors)
    }

    // ───────────────────────────── cursor ─────────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `ahead` positions past the cursor, or `0` beyond the end.
    #[inline(always)]
    fn peek_at(&self, ahead: usize) -> u8 {
        self.bytes().get(self.curr + ahead).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.src[self.start..self.curr]
    }

    /// `double` if the next byte is `second` (consuming it), else `single`.
    #[inline]
    fn one_or_two(&mut self, second: u8, double: TokenType, single: TokenType) -> TokenType {
        if self.peek_at(0) == second {
            self.curr += 1;
            double
        } else {
            single
        }
    }

    // ───────────────────────────── lexing ─────────────────────────────

    /// Lex one lexeme starting at `self.start`.  `Ok(None)` means it was
    /// whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.advance() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.one_or_two(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.one_or_two(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.one_or_two(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.one_or_two(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.peek_at(0) == b'/' => {
                // The newline stays put so the line counter sees it.
                self.curr = match memchr(b'\n', &self.bytes()[self.curr..]) {
                    Some(offset) => self.curr + offset,
                    None => self.src.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            other => {
                let c = self.src[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(other as char);
                self.curr = self.start + c.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        Ok(Some(kind))
    }

    /// Body of a string literal; the opening quote is already consumed.  May
    /// span lines.
    fn string(&mut self) -> Result<TokenType> {
        let Some(len) = memchr(b'"', &self.bytes()[self.curr..]) else {
            self.line += self.bytes()[self.curr..].iter().filter(|&&b| b == b'\n').count();
            self.curr = self.src.len();
            return Err(LoxError::lex(self.line, "Unterminated string."));
        };

        let body = &self.src[self.curr..self.curr + len];
        self.line += body.bytes().filter(|&b| b == b'\n').count();
        self.curr += len + 1;

        Ok(TokenType::STRING(body.to_owned()))
    }

    /// Digits with an optional fractional part.  A trailing `.` is left for
    /// the next token.
    fn number(&mut self) -> TokenType {
        let skip_digits = |s: &mut Self| {
            while s.peek_at(0).is_ascii_digit() {
                s.curr += 1;
            }
        };

        skip_digits(self);
        if self.peek_at(0) == b'.' && self.peek_at(1).is_ascii_digit() {
            self.curr += 1;
            skip_digits(self);
        }

        // Only ASCII digits and at most one interior '.' were consumed.
        TokenType::NUMBER(self.lexeme().parse().unwrap_or(0.0))
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.peek_at(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        KEYWORDS
            .get(self.lexeme())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if self.is_at_end() {
                self.finished = true;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    debug!("Scanned token ({:?}) on line {}", kind, self.line);
                    return Some(Ok(Token::new(kind, self.lexeme(), self.line)));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
