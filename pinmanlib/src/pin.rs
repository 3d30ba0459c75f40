//! Formatting and validation of PIN codes

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{Error, Result};

/// Number of digits in a PIN code
pub const PIN_DIGITS: usize = 20;

lazy_static! {
    static ref PIN_REGEX: Regex = Regex::new(r"^[0-9]{5}-[0-9]{5}-[0-9]{5}-[0-9]{5}$").unwrap();
}

/// Groups a bare 20 digit PIN as `NNNNN-NNNNN-NNNNN-NNNNN`. Any other input, including an already
/// formatted PIN, is returned unchanged.
pub fn format_pin(pin: &str) -> String {
    if pin.len() == PIN_DIGITS && pin.bytes().all(|b| b.is_ascii_digit()) {
        format!(
            "{}-{}-{}-{}",
            &pin[..5],
            &pin[5..10],
            &pin[10..15],
            &pin[15..]
        )
    } else {
        pin.to_string()
    }
}

/// Removes the hyphens from a formatted PIN
pub fn unformat_pin(pin: &str) -> String {
    pin.replace('-', "")
}

/// Returns true if the PIN is in canonical `NNNNN-NNNNN-NNNNN-NNNNN` form
pub fn is_valid_pin_format(pin: &str) -> bool {
    PIN_REGEX.is_match(pin)
}

/// Trims and formats user input, returning the canonical form or [Error::BadInput].
pub fn normalize_pin(pin: &str) -> Result<String> {
    let formatted = format_pin(pin.trim());
    if is_valid_pin_format(&formatted) {
        Ok(formatted)
    } else {
        debug!("Rejected PIN input of length {}", pin.len());
        Err(Error::BadInput)
    }
}

/// Splits a formatted PIN into its four five-digit groups
pub fn pin_groups(pin: &str) -> Vec<&str> {
    pin.split('-').collect()
}

/// Hides all but the last group of a canonical PIN for use in log messages, i.e.,
/// `*****-*****-*****-44444`. Anything else is masked entirely.
pub fn mask_pin(pin: &str) -> String {
    match pin.rsplit_once('-') {
        Some((_, last)) if is_valid_pin_format(pin) => format!("*****-*****-*****-{last}"),
        _ => "*".repeat(pin.len()),
    }
}

#[test]
fn format_groups_bare_digits() {
    assert_eq!(
        format_pin("12345678901234567890"),
        "12345-67890-12345-67890"
    );
    assert_eq!(format_pin("1234"), "1234");
    assert_eq!(format_pin("1234567890123456789a"), "1234567890123456789a");
}

#[test]
fn format_is_idempotent() {
    let once = format_pin("00000111112222233333");
    assert_eq!(format_pin(&once), once);
    assert!(is_valid_pin_format(&once));
}

#[test]
fn normalize_accepts_both_forms() {
    assert_eq!(
        normalize_pin(" 12345678901234567890 ").unwrap(),
        "12345-67890-12345-67890"
    );
    assert_eq!(
        normalize_pin("12345-67890-12345-67890").unwrap(),
        "12345-67890-12345-67890"
    );
    assert_eq!(normalize_pin("12345-67890-12345"), Err(Error::BadInput));
    assert_eq!(normalize_pin("1234-567890-12345-67890"), Err(Error::BadInput));
}

#[test]
fn unformat_and_groups() {
    assert_eq!(
        unformat_pin("12345-67890-12345-67890"),
        "12345678901234567890"
    );
    assert_eq!(
        pin_groups("12345-67890-11111-22222"),
        vec!["12345", "67890", "11111", "22222"]
    );
}

#[test]
fn mask_keeps_last_group() {
    assert_eq!(mask_pin("11111-22222-33333-44444"), "*****-*****-*****-44444");
    assert_eq!(mask_pin("1234"), "****");
}
