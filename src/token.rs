use serde::Serialize;
use std::fmt;
use std::mem;

/// Declares [`TokenType`] and its `name()` from one list, so the printed
/// kind can never drift from the variant.
macro_rules! token_types {
    ( $( $variant:ident $( ($payload:ty) )? ),* $(,)? ) => {
        /// Kinds of token produced by the scanner.
        ///
        /// `STRING` and `NUMBER` carry their decoded literal; every other kind
        /// is fully described by its lexeme.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Serialize)]
        pub enum TokenType {
            $( $variant $( ($payload) )?, )*
        }

        impl TokenType {
            /// Variant name without payload, as printed by `tokenize`.
            pub fn name(&self) -> &'static str {
                match self {
                    $( TokenType::$variant { .. } => stringify!($variant), )*
                }
            }
        }
    };
}

token_types! {
    // punctuation
    LEFT_PAREN, RIGHT_PAREN, LEFT_BRACE, RIGHT_BRACE,
    COMMA, DOT, MINUS, PLUS, SEMICOLON, SLASH, STAR,

    // one or two characters
    BANG, BANG_EQUAL,
    EQUAL, EQUAL_EQUAL,
    GREATER, GREATER_EQUAL,
    LESS, LESS_EQUAL,

    // literals
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // keywords
    AND, CLASS, ELSE, FALSE, FUN, FOR, IF, NIL, OR,
    PRINT, RETURN, SUPER, THIS, TRUE, VAR, WHILE,

    EOF,
}

/// Kinds compare by variant alone, so `check(TokenType::NUMBER(0.0))` matches
/// any number.
impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token.  Owns its lexeme so the AST can outlive the source text.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    pub token_type: TokenType,

    /// Exact source text, quotes included for strings.
    pub lexeme: String,

    /// 1‑based.
    pub line: usize,
}

impl Token {
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        Self {
            token_type,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Where a diagnostic points: `" at end"` for EOF, `" at 'lexeme'"` otherwise.
    pub fn location(&self) -> String {
        match self.token_type {
            TokenType::EOF => " at end".to_string(),
            _ => format!(" at '{}'", self.lexeme),
        }
    }
}

/// `KIND lexeme literal`, with `null` standing in for a missing literal.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.token_type {
            TokenType::STRING(s) => f.write_str(s),

            // 3 → "3.0", 3.14 → "3.14"
            TokenType::NUMBER(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                let mut buf = itoa::Buffer::new();
                write!(f, "{}.0", buf.format(*n as i64))
            }

            TokenType::NUMBER(n) => write!(f, "{}", n),

            _ => f.write_str("null"),
        }
    }
}
