//! Decoder for DSMR / IEC 62056-21 P1 telegrams
//!
//! Turns one complete raw telegram into a typed tree of channel objects and
//! verifies its CRC16 footer. Reading the serial port and splitting the byte
//! stream into telegrams is left to the caller.

pub mod config;
pub mod obis_utils;
pub mod telegram;

// Re-export common types for easier access
pub use config::ParseOptions;
pub use telegram::number::{Number, NumberError};
pub use telegram::structs::*;
pub use telegram::{calculate_checksum, decode, parse, parse_with_options, verify_checksum, TelegramError};
