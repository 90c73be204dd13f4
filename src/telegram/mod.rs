use crate::config::ParseOptions;
use log::debug;
use thiserror::Error;

pub mod checksum;
pub mod lexer;
pub mod number;
pub mod obis_parser;
pub mod structs;

use lexer::{unexpected, Token, TokenKind};
use obis_parser::ObjectShape;
use structs::*;

pub use checksum::{calculate_checksum, verify_checksum};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelegramError {
    #[error("{position}: {message}")]
    Syntax { position: Position, message: String },
    #[error("checksum mismatch: expected {expected}, computed {computed}")]
    Checksum { expected: String, computed: String },
}

/// Decodes and verifies one telegram using the default options.
pub fn parse(raw: &str) -> Result<Telegram, TelegramError> {
    parse_with_options(raw, &ParseOptions::default())
}

pub fn parse_with_options(raw: &str, options: &ParseOptions) -> Result<Telegram, TelegramError> {
    let telegram = decode(raw)?;
    verify_checksum(&telegram, raw, options)?;
    Ok(telegram)
}

/// Structural decode only, the footer is never checked against the content.
///
/// Expects exactly one complete telegram: header through `!` and the optional
/// checksum digits.
pub fn decode(raw: &str) -> Result<Telegram, TelegramError> {
    let tokens = lexer::tokenize(raw)?;
    let mut cursor = Cursor::new(&tokens);

    let header = cursor.header()?;
    let mut data = Vec::new();

    let footer = loop {
        cursor.skip_newlines();
        let token = cursor.peek();
        match &token.kind {
            TokenKind::Obis(_) => {
                data.push(cursor.object()?);
                cursor.end_of_line()?;
            }
            TokenKind::Footer(crc) => {
                let footer = crc.as_ref().map(|value| Footer { value: value.clone() });
                cursor.advance(1);
                break footer;
            }
            _ => return Err(unexpected(&token.describe(), token.pos)),
        }
    };

    cursor.skip_newlines();
    let token = cursor.peek();
    if token.kind != TokenKind::Eof {
        return Err(unexpected(&token.describe(), token.pos));
    }

    debug!("Decoded telegram {} with {} objects", header.value, data.len());
    Ok(Telegram { header, data, footer })
}

/// Single cursor over the whole telegram, so an object may reach into the
/// following line.
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    // The token stream always ends with Eof, which is returned from then on.
    fn peek(&self) -> &'t Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.tokens.len() - 1);
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance(1);
        }
    }

    fn header(&mut self) -> Result<Header, TelegramError> {
        let token = self.peek();
        let value = match &token.kind {
            TokenKind::Header(value) => value.clone(),
            _ => return Err(unexpected(&token.describe(), token.pos)),
        };
        self.advance(1);
        self.end_of_line()?;
        Ok(Header { value })
    }

    fn end_of_line(&mut self) -> Result<(), TelegramError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Newline => {
                self.advance(1);
                Ok(())
            }
            _ => Err(unexpected(&token.describe(), token.pos)),
        }
    }

    fn object(&mut self) -> Result<Object, TelegramError> {
        let tokens = self.tokens;
        let (shape, line_len) = ObjectShape::gather(&tokens[self.pos..])?;
        let (value, rule) = obis_parser::classify(&shape)?;

        let mut consumed = line_len;
        if rule.spans_lines {
            // leave the continuation's own line break for end_of_line
            consumed += shape.continuation_len();
        }

        let object = Object { obis: Obis::new(shape.obis), value, pos: shape.pos };
        self.advance(consumed);
        Ok(object)
    }
}
