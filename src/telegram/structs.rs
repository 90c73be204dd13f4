use super::number::Number;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// 1-based source location of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Channel reference (A-B:C.D.E[.F]), kept as an opaque label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Obis(String);

impl Obis {
    pub fn new(code: impl Into<String>) -> Self {
        Obis(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Obis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identification line without the leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub value: String,
}

impl Header {
    /// Three letter flag id, e.g. `ISk` for `/ISk5\2MT382-1000`.
    pub fn manufacturer(&self) -> Option<&str> {
        let flag = self.value.get(..3)?;
        if flag.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(flag)
        } else {
            None
        }
    }
}

/// CRC digits following the `!` terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footer {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telegram {
    pub header: Header,
    pub data: Vec<Object>,
    pub footer: Option<Footer>,
}

impl Telegram {
    /// First object carrying the given channel reference.
    pub fn get(&self, obis: &str) -> Option<&Object> {
        self.data.iter().find(|o| o.obis.as_str() == obis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Object {
    pub obis: Obis,
    pub value: Value,
    #[serde(skip)]
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Number(Number),
    Measurement(Measurement),
    LegacyMeasurement(LegacyMeasurement),
    Timestamp(Timestamp),
    Event(Event),
    EventLog(EventLog),
    LastCapture(LastCapture),
    LegacyLastCapture(LegacyLastCapture),
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub value: Number,
    pub unit: String,
}

/// Same shape as [`Measurement`], produced by the two-line layout of DSMR 2.2/3.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyMeasurement {
    pub value: Number,
    pub unit: String,
}

/// YYMMDDhhmmss plus the DST flag taken from the trailing `S`/`W` letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    pub value: String,
    pub dst: bool,
}

impl Timestamp {
    /// Calendar view of the timestamp. `None` for impossible dates, which the
    /// decoder itself lets through.
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.value, "%y%m%d%H%M%S").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: Timestamp,
    pub value: Measurement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLog {
    pub count: Number,
    pub obis: Obis,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastCapture {
    pub timestamp: Timestamp,
    pub value: Measurement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyLastCapture {
    pub timestamp: String,
    pub obis: Obis,
    pub value: LegacyMeasurement,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_header_manufacturer() {
        let header = Header { value: "ISk5\\2MT382-1000".to_string() };
        assert_eq!(header.manufacturer(), Some("ISk"));

        let header = Header { value: "KFM5KAIFA-METER".to_string() };
        assert_eq!(header.manufacturer(), Some("KFM"));

        let header = Header { value: "X1".to_string() };
        assert_eq!(header.manufacturer(), None);
    }

    #[test]
    fn test_timestamp_calendar_view() {
        let ts = Timestamp { value: "161113205757".to_string(), dst: false };
        let dt = ts.to_naive_datetime().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2016, 11, 13));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (20, 57, 57));

        let ts = Timestamp { value: "000104180320".to_string(), dst: false };
        assert_eq!(ts.to_naive_datetime().unwrap().year(), 2000);

        let ts = Timestamp { value: "161332000000".to_string(), dst: true };
        assert_eq!(ts.to_naive_datetime(), None);
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(3, 14).to_string(), "3:14");
    }
}
