use super::structs::Position;
use super::TelegramError;
use crate::obis_utils;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    static ref FOOTER: Regex = Regex::new(r"^!([0-9A-F]{4})?").unwrap();
    static ref WORD: Regex = Regex::new(r"^[A-Za-z0-9]+").unwrap();
}

/// Parenthesized group, content kept byte-exact without the delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub content: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Header(String),
    Obis(String),
    Group(Group),
    Newline,
    Footer(Option<String>),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    /// Source-like rendering used in diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Header(h) => format!("/{}", h),
            TokenKind::Obis(o) => o.clone(),
            TokenKind::Group(g) => format!("({})", g.content),
            TokenKind::Newline => "\\n".to_string(),
            TokenKind::Footer(Some(crc)) => format!("!{}", crc),
            TokenKind::Footer(None) => "!".to_string(),
            TokenKind::Eof => "<EOF>".to_string(),
        }
    }
}

pub fn unexpected(text: &str, pos: Position) -> TelegramError {
    TelegramError::Syntax {
        position: pos,
        message: format!("unexpected token \"{}\"", text),
    }
}

struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, offset: 0, line: 1, column: 1 }
    }

    fn rest(&self) -> &'a str {
        let src = self.src;
        &src[self.offset..]
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    // Only for input on a single line; newlines go through next_token.
    fn bump(&mut self, len: usize) -> &'a str {
        let src = self.src;
        let text = &src[self.offset..self.offset + len];
        self.offset += len;
        self.column += text.chars().count();
        text
    }

    fn next_token(&mut self) -> Result<Token, TelegramError> {
        // Horizontal whitespace between tokens carries nothing
        let skipped = self.rest().len() - self.rest().trim_start_matches([' ', '\t']).len();
        self.bump(skipped);

        let pos = self.position();
        let rest = self.rest();

        let kind = if rest.is_empty() {
            TokenKind::Eof
        } else if rest.starts_with("\r\n") || rest.starts_with('\n') {
            self.offset += if rest.starts_with('\r') { 2 } else { 1 };
            self.line += 1;
            self.column = 1;
            TokenKind::Newline
        } else if rest.starts_with('/') {
            let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
            let text = self.bump(end);
            TokenKind::Header(text[1..].to_string())
        } else if rest.starts_with('(') {
            let end = match rest.find([')', '\r', '\n']) {
                Some(i) if rest.as_bytes()[i] == b')' => i,
                _ => {
                    return Err(TelegramError::Syntax {
                        position: pos,
                        message: "unterminated group \"(\"".to_string(),
                    })
                }
            };
            let text = self.bump(end + 1);
            TokenKind::Group(Group { content: text[1..end].to_string(), pos })
        } else if let Some(caps) = FOOTER.captures(rest) {
            let len = caps.get(0).map_or(1, |m| m.end());
            let crc = caps.get(1).map(|m| m.as_str().to_string());
            self.bump(len);
            TokenKind::Footer(crc)
        } else if let Some(code) = obis_utils::match_obis_prefix(rest) {
            let code = self.bump(code.len());
            TokenKind::Obis(code.to_string())
        } else {
            let text = match WORD.find(rest) {
                Some(m) => m.as_str(),
                None => rest.chars().next().map_or("", |c| &rest[..c.len_utf8()]),
            };
            return Err(unexpected(text, pos));
        };

        Ok(Token { kind, pos })
    }
}

/// Splits a raw telegram into tokens; the last token is always `Eof`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, TelegramError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    debug!("Tokenized telegram into {} tokens", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn group(content: &str, line: usize, column: usize) -> TokenKind {
        TokenKind::Group(Group { content: content.to_string(), pos: Position::new(line, column) })
    }

    #[test]
    fn test_tokenize_object_line() {
        assert_eq!(
            kinds("1-0:1.8.1(000123.456*kWh)\r\n"),
            vec![
                TokenKind::Obis("1-0:1.8.1".to_string()),
                group("000123.456*kWh", 1, 10),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_header_and_footer() {
        assert_eq!(
            kinds("/ISk5\\2MT382-1000\r\n\r\n!6796\r\n"),
            vec![
                TokenKind::Header("ISk5\\2MT382-1000".to_string()),
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Footer(Some("6796".to_string())),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("!\r\n")[0], TokenKind::Footer(None));
    }

    #[test]
    fn test_positions_span_lines() {
        let tokens = tokenize("/X\r\n0-1:24.3.0(1)(m3)\r\n(00001.001)\r\n").unwrap();
        assert_eq!(tokens[2].pos, Position::new(2, 1));
        assert_eq!(tokens[3].pos, Position::new(2, 11));
        assert_eq!(tokens[4].pos, Position::new(2, 14));
        assert_eq!(tokens[6].pos, Position::new(3, 1));
    }

    #[test]
    fn test_group_content_is_verbatim() {
        assert_eq!(kinds("( a*b )")[0], group(" a*b ", 1, 1));
        assert_eq!(kinds("()")[0], group("", 1, 1));
    }

    #[test]
    fn test_unexpected_token() {
        let err = tokenize("invalid_telegram").unwrap_err();
        assert_eq!(err.to_string(), "1:1: unexpected token \"invalid\"");

        let err = tokenize("/X\r\n#").unwrap_err();
        assert_eq!(err.to_string(), "2:1: unexpected token \"#\"");
    }

    #[test]
    fn test_unterminated_group() {
        let err = tokenize("1-0:1.8.1(000123.456\r\n)").unwrap_err();
        assert_eq!(err.to_string(), "1:10: unterminated group \"(\"");
    }
}
