use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A-B:C.D.E with an optional .F storage field
    static ref OBIS_PREFIX: Regex = Regex::new(r"^\d+-\d+:\d+\.\d+\.\d+(?:\.\d+)?").unwrap();
    static ref OBIS_CODE: Regex = Regex::new(r"^\d+-\d+:\d+\.\d+\.\d+(?:\.\d+)?$").unwrap();
}

/// Returns the channel reference at the start of `input`, if there is one.
pub fn match_obis_prefix(input: &str) -> Option<&str> {
    OBIS_PREFIX.find(input).map(|m| m.as_str())
}

pub fn validate_obis_code(code: &str) -> bool {
    // OBIS code format: A-B:C.D.E[.F]
    // A: Medium (0=abstract, 1=electricity, 6=heat, 7=gas, 8=water)
    // B: Channel
    // C: Physical value
    // D: Processing method
    // E: Tariff/Time
    // F: Storage (optional)
    if !OBIS_CODE.is_match(code) {
        return false;
    }

    code.split(|c| c == '-' || c == ':' || c == '.')
        .all(|part| part.parse::<u8>().is_ok())
}
