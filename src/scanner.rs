//! Streaming lexer for Lox source text.
//!
//! [`Scanner`] walks the source once and yields `Result<Token>` items: whitespace
//! and `//` comments are dropped, every other lexeme becomes a [`Token`], and the
//! stream ends with exactly one `EOF`. A lexing error is just another item; the
//! next call picks up right after the offending character, so a single pass
//! reports every bad character in the file. The iterator is fused.
//!
//! Lexemes are recognised byte by byte. Lox keywords and punctuation are ASCII,
//! so non‑ASCII text only ever shows up inside string literals (copied through
//! untouched) or as an "Unexpected character" error covering the whole char.
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let (tokens, errors) = Scanner::scan_all("print 123; // example");
//! assert!(errors.is_empty());
//! assert_eq!(tokens.len(), 4); // PRINT NUMBER SEMICOLON EOF
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

/// Reserved words, looked up once an identifier‑shaped lexeme is complete.
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
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next byte to look at. One past the end once `EOF` has been emitted.
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            pos: 0,
            line: 1,
        }
    }

    /// Drain the whole input, splitting good tokens from lexing errors.
    /// The token vector always ends with `EOF`.
    pub fn scan_all(src: &'a str) -> (Vec<Token>, Vec<LoxError>) {
        let (ok, bad): (Vec<_>, Vec<_>) = Scanner::new(src).partition(|r| r.is_ok());

        let tokens: Vec<Token> = ok.into_iter().filter_map(|r| r.ok()).collect();
        let errors: Vec<LoxError> = bad.into_iter().filter_map(|r| r.err()).collect();

        info!(
            "Scanned {} token(s) with {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    // ── cursor ──────────────────────────────────────────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Byte `offset` places ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn look(&self, offset: usize) -> u8 {
        self.bytes().get(self.pos + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b = self.look(0);
        self.pos += 1;
        b
    }

    /// Consume bytes while `pred` holds.
    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.at_end() && pred(self.look(0)) {
            self.pos += 1;
        }
    }

    /// `long` if the next byte is `=`, consuming it; `short` otherwise.
    fn with_equals(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.look(0) == b'=' {
            self.pos += 1;
            long
        } else {
            short
        }
    }

    // ── lexemes ─────────────────────────────────────────────────────────────

    /// Scan from `self.start`. `Ok(None)` means the bytes were insignificant
    /// (whitespace, a newline or a comment).
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.bump() {
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

            b'!' => self.with_equals(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equals(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.look(0) == b'/' => {
                // Stop on the newline so the main loop still counts it.
                self.pos = match memchr(b'\n', &self.bytes()[self.pos..]) {
                    Some(offset) => self.pos + offset,
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

            _ => return Err(self.unexpected()),
        };

        Ok(Some(kind))
    }

    /// Body of a string literal; the opening quote is already consumed.
    /// Strings may span lines.
    fn string(&mut self) -> Result<TokenType> {
        loop {
            match self.look(0) {
                _ if self.at_end() => {
                    return Err(LoxError::lex(self.line, "Unterminated string."));
                }
                b'"' => break,
                b'\n' => self.line += 1,
                _ => {}
            }
            self.pos += 1;
        }

        self.pos += 1; // closing quote
        let text = &self.src[self.start + 1..self.pos - 1];

        Ok(TokenType::STRING(text.to_owned()))
    }

    /// `123` or `3.14`. A trailing `.` with no digit after it is left alone.
    fn number(&mut self) -> TokenType {
        self.eat_while(|b| b.is_ascii_digit());

        if self.look(0) == b'.' && self.look(1).is_ascii_digit() {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit());
        }

        // ASCII digits with at most one interior '.' always parse.
        let value = self.src[self.start..self.pos].parse().unwrap_or(0.0);
        TokenType::NUMBER(value)
    }

    fn identifier(&mut self) -> TokenType {
        self.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');

        KEYWORDS
            .get(&self.src[self.start..self.pos])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }

    /// Error for the character at `self.start`, consuming all of its bytes so
    /// the next lexeme begins on a char boundary.
    fn unexpected(&mut self) -> LoxError {
        let c = self.src[self.start..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.pos = self.start + c.len_utf8();

        LoxError::lex(self.line, format!("Unexpected character: {}", c))
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos > self.src.len() {
                return None;
            }

            if self.at_end() {
                self.pos += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.pos;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    debug!("Scanned {} on line {}", kind.name(), self.line);
                    let lexeme = &self.src[self.start..self.pos];
                    return Some(Ok(Token::new(kind, lexeme, self.line)));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl FusedIterator for Scanner<'_> {}
