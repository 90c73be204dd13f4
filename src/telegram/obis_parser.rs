//! Classifies the groups following a channel reference into a [`Value`].
//!
//! Protocol revisions reuse the same channel references for differently
//! encoded payloads, so classification looks only at the shape of the groups.
//! [`RULES`] is tried in order and the first match wins.

use super::lexer::{unexpected, Group, Token, TokenKind};
use super::number::{
    is_bare_timestamp, is_unit, parse_count, parse_decimal, parse_measurement, parse_timestamp,
};
use super::structs::*;
use super::TelegramError;
use crate::obis_utils::validate_obis_code;
use log::debug;

/// A channel reference with the groups on its line and, when the next physical
/// line starts with a group, the groups of that line.
#[derive(Debug)]
pub struct ObjectShape<'t> {
    pub obis: &'t str,
    pub pos: Position,
    pub groups: Vec<&'t Group>,
    pub continuation: Option<Vec<&'t Group>>,
}

impl<'t> ObjectShape<'t> {
    /// Reads an object starting at `tokens[0]`, which must be a channel reference.
    ///
    /// Returns the shape and the number of tokens on the reference's own line.
    pub fn gather(tokens: &'t [Token]) -> Result<(ObjectShape<'t>, usize), TelegramError> {
        let (obis, pos) = match tokens.first() {
            Some(Token { kind: TokenKind::Obis(code), pos }) => (code.as_str(), *pos),
            Some(token) => return Err(unexpected(&token.describe(), token.pos)),
            None => return Err(unexpected("<EOF>", Position::default())),
        };

        let groups = leading_groups(&tokens[1..]);
        if groups.is_empty() {
            let next = &tokens[1.min(tokens.len() - 1)];
            return Err(unexpected(&next.describe(), next.pos));
        }
        let line_len = 1 + groups.len();

        let continuation = match tokens.get(line_len) {
            Some(Token { kind: TokenKind::Newline, .. }) => {
                let next_line = leading_groups(&tokens[line_len + 1..]);
                if next_line.is_empty() {
                    None
                } else {
                    Some(next_line)
                }
            }
            _ => None,
        };

        Ok((ObjectShape { obis, pos, groups, continuation }, line_len))
    }

    fn single(&self) -> Option<&'t str> {
        match self.groups.as_slice() {
            [g] => {
                let g: &'t Group = *g;
                Some(g.content.as_str())
            }
            _ => None,
        }
    }

    fn content(&self, index: usize) -> &'t str {
        let g: &'t Group = self.groups[index];
        g.content.as_str()
    }

    /// Tokens the continuation line occupies, including its leading newline.
    pub fn continuation_len(&self) -> usize {
        self.continuation.as_ref().map_or(0, |c| 1 + c.len())
    }

    fn mismatch(&self) -> TelegramError {
        let index = diagnose(self);
        let group = self
            .groups
            .get(index)
            .copied()
            .or_else(|| self.continuation.as_ref().and_then(|c| c.first().copied()));
        let (pos, text) = match group {
            Some(g) => (g.pos, format!("({})", g.content)),
            None => (self.pos, "<EOL>".to_string()),
        };
        TelegramError::Syntax {
            position: pos,
            message: format!(
                "unexpected group {} {} of object \"{}\"",
                index + 1,
                text,
                self.obis
            ),
        }
    }
}

fn leading_groups(tokens: &[Token]) -> Vec<&Group> {
    tokens
        .iter()
        .map_while(|t| match &t.kind {
            TokenKind::Group(g) => Some(g),
            _ => None,
        })
        .collect()
}

/// One classification rule: a shape predicate and the constructor it guards.
pub struct Rule {
    pub name: &'static str,
    /// The rule consumes the continuation line.
    pub spans_lines: bool,
    pub matches: fn(&ObjectShape) -> bool,
    pub build: fn(&ObjectShape) -> Result<Value, TelegramError>,
}

pub const RULES: &[Rule] = &[
    Rule { name: "absent", spans_lines: false, matches: is_absent, build: build_absent },
    Rule { name: "timestamp", spans_lines: false, matches: is_timestamp, build: build_timestamp },
    Rule { name: "measurement", spans_lines: false, matches: is_measurement, build: build_measurement },
    Rule { name: "string", spans_lines: false, matches: is_string, build: build_string },
    Rule { name: "last_capture", spans_lines: false, matches: is_last_capture, build: build_last_capture },
    Rule { name: "event_log", spans_lines: false, matches: is_event_log, build: build_event_log },
    Rule {
        name: "legacy_last_capture",
        spans_lines: true,
        matches: is_legacy_last_capture,
        build: build_legacy_last_capture,
    },
];

/// Picks the first matching rule and builds its value.
pub fn classify(shape: &ObjectShape) -> Result<(Value, &'static Rule), TelegramError> {
    for rule in RULES {
        if (rule.matches)(shape) {
            debug!("Object {} at {} classified as {}", shape.obis, shape.pos, rule.name);
            return Ok(((rule.build)(shape)?, rule));
        }
    }
    Err(shape.mismatch())
}

fn is_absent(shape: &ObjectShape) -> bool {
    shape.single() == Some("")
}

fn build_absent(_: &ObjectShape) -> Result<Value, TelegramError> {
    Ok(Value::Absent)
}

fn is_timestamp(shape: &ObjectShape) -> bool {
    shape.single().and_then(parse_timestamp).is_some()
}

fn build_timestamp(shape: &ObjectShape) -> Result<Value, TelegramError> {
    shape
        .single()
        .and_then(parse_timestamp)
        .map(Value::Timestamp)
        .ok_or_else(|| shape.mismatch())
}

fn measurement(content: &str) -> Option<Measurement> {
    parse_measurement(content).map(|(value, unit)| Measurement { value, unit: unit.to_string() })
}

fn is_measurement(shape: &ObjectShape) -> bool {
    shape.single().and_then(measurement).is_some()
}

fn build_measurement(shape: &ObjectShape) -> Result<Value, TelegramError> {
    shape
        .single()
        .and_then(measurement)
        .map(Value::Measurement)
        .ok_or_else(|| shape.mismatch())
}

fn is_string(shape: &ObjectShape) -> bool {
    shape.single().is_some_and(|c| !c.contains('*'))
}

fn build_string(shape: &ObjectShape) -> Result<Value, TelegramError> {
    shape
        .single()
        .map(|c| Value::String(c.to_string()))
        .ok_or_else(|| shape.mismatch())
}

fn last_capture(shape: &ObjectShape) -> Option<LastCapture> {
    if shape.groups.len() != 2 {
        return None;
    }
    Some(LastCapture {
        timestamp: parse_timestamp(shape.content(0))?,
        value: measurement(shape.content(1))?,
    })
}

fn is_last_capture(shape: &ObjectShape) -> bool {
    last_capture(shape).is_some()
}

fn build_last_capture(shape: &ObjectShape) -> Result<Value, TelegramError> {
    last_capture(shape).map(Value::LastCapture).ok_or_else(|| shape.mismatch())
}

// (count)(obis) followed by `count` pairs of (timestamp)(duration)
fn event_log(shape: &ObjectShape) -> Option<EventLog> {
    if shape.groups.len() < 2 || shape.groups.len() % 2 != 0 {
        return None;
    }
    let count = parse_count(shape.content(0))?;
    let obis = shape.content(1);
    if !validate_obis_code(obis) {
        return None;
    }

    let events = shape.groups[2..]
        .chunks(2)
        .map(|pair| {
            Some(Event {
                timestamp: parse_timestamp(&pair[0].content)?,
                value: measurement(&pair[1].content)?,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    if count.as_integer() != Some(events.len() as i128) {
        return None;
    }

    Some(EventLog { count, obis: Obis::new(obis), events })
}

fn is_event_log(shape: &ObjectShape) -> bool {
    event_log(shape).is_some()
}

fn build_event_log(shape: &ObjectShape) -> Result<Value, TelegramError> {
    event_log(shape).map(Value::EventLog).ok_or_else(|| shape.mismatch())
}

// (timestamp)(-)(-)(-)(obis)(unit) with the value alone on the next line
fn legacy_last_capture(shape: &ObjectShape) -> Option<LegacyLastCapture> {
    if shape.groups.len() != 6 {
        return None;
    }
    let timestamp = shape.content(0);
    let obis = shape.content(4);
    let unit = shape.content(5);
    if !is_bare_timestamp(timestamp) || !validate_obis_code(obis) || !is_unit(unit) {
        return None;
    }

    let value = match shape.continuation.as_deref() {
        Some([g]) => parse_decimal(&g.content)?,
        _ => return None,
    };

    Some(LegacyLastCapture {
        timestamp: timestamp.to_string(),
        obis: Obis::new(obis),
        value: LegacyMeasurement { value, unit: unit.to_string() },
    })
}

fn is_legacy_last_capture(shape: &ObjectShape) -> bool {
    legacy_last_capture(shape).is_some()
}

fn build_legacy_last_capture(shape: &ObjectShape) -> Result<Value, TelegramError> {
    legacy_last_capture(shape)
        .map(Value::LegacyLastCapture)
        .ok_or_else(|| shape.mismatch())
}

/// Index of the first group that keeps the shape from matching the closest rule.
/// `groups.len()` points at the continuation line.
fn diagnose(shape: &ObjectShape) -> usize {
    let n = shape.groups.len();
    if n <= 1 {
        return 0;
    }

    let g = |i: usize| shape.content(i);
    if parse_timestamp(g(0)).is_some() {
        return if n == 2 { 1 } else { 2 };
    }

    if n == 6 && is_bare_timestamp(g(0)) {
        if !validate_obis_code(g(4)) {
            return 4;
        }
        if !is_unit(g(5)) {
            return 5;
        }
        return n;
    }

    if parse_count(g(0)).is_some() {
        if !validate_obis_code(g(1)) {
            return 1;
        }
        for i in 2..n {
            let ok = if i % 2 == 0 {
                parse_timestamp(g(i)).is_some()
            } else {
                measurement(g(i)).is_some()
            };
            if !ok {
                return i;
            }
        }
        if n % 2 != 0 {
            return n - 1;
        }
    }

    0
}
