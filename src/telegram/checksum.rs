use super::structs::Telegram;
use super::TelegramError;
use crate::config::ParseOptions;
use crc16::{State, ARC};
use log::{debug, warn};

/// CRC16/ARC over the telegram up to and including the first `!`, as four
/// uppercase hex digits.
pub fn calculate_checksum(raw: &str) -> String {
    let message = match raw.find('!') {
        Some(end) => &raw[..=end],
        None => raw,
    };
    format!("{:04X}", State::<ARC>::calculate(message.as_bytes()))
}

/// Compares the parsed footer with the checksum of `raw`.
///
/// Succeeds without computing anything when verification is disabled or the
/// telegram carried no checksum (DSMR 2.2 and 3.0).
pub fn verify_checksum(telegram: &Telegram, raw: &str, options: &ParseOptions) -> Result<(), TelegramError> {
    if !options.verify_checksum {
        debug!("Checksum verification disabled");
        return Ok(());
    }

    let expected = match &telegram.footer {
        Some(footer) => &footer.value,
        None => {
            debug!("Telegram has no checksum, skipping verification");
            return Ok(());
        }
    };

    let computed = calculate_checksum(raw);
    if *expected != computed {
        warn!("Checksum mismatch: telegram says {}, computed {}", expected, computed);
        return Err(TelegramError::Checksum { expected: expected.clone(), computed });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::structs::{Footer, Header};

    fn telegram(footer: Option<&str>) -> Telegram {
        Telegram {
            header: Header { value: "X".to_string() },
            data: Vec::new(),
            footer: footer.map(|f| Footer { value: f.to_string() }),
        }
    }

    #[test]
    fn test_calculate_checksum() {
        // CRC-16/ARC check value
        assert_eq!(calculate_checksum("123456789"), "BB3D");
        assert_eq!(calculate_checksum(""), "0000");
    }

    #[test]
    fn test_only_prefix_through_terminator_counts() {
        assert_eq!(calculate_checksum("/X\r\n!1234\r\n"), calculate_checksum("/X\r\n!"));
        assert_ne!(calculate_checksum("/X\r\n!"), calculate_checksum("/Y\r\n!"));
    }

    #[test]
    fn test_verify_skipped_without_footer() {
        let opts = ParseOptions::default();
        assert!(verify_checksum(&telegram(None), "/X\r\n!\r\n", &opts).is_ok());
    }

    #[test]
    fn test_verify_skipped_when_disabled() {
        let opts = ParseOptions::default().with_checksum(false);
        assert!(verify_checksum(&telegram(Some("0000")), "/X\r\n!0000\r\n", &opts).is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let raw = "/X\r\n!0000\r\n";
        let computed = calculate_checksum(raw);
        let err = verify_checksum(&telegram(Some("0000")), raw, &ParseOptions::default()).unwrap_err();
        assert_eq!(err, TelegramError::Checksum { expected: "0000".to_string(), computed });
    }

    #[test]
    fn test_verify_match() {
        let raw = "/X\r\n!\r\n";
        let crc = calculate_checksum(raw);
        assert!(verify_checksum(&telegram(Some(&crc)), raw, &ParseOptions::default()).is_ok());
    }
}
