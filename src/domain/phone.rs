use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::RelayError;

static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[0-9]{10,15}$").expect("phone number pattern is valid"));

/// Checks that `phone` is in international format: a leading `+` and 10 to 15 ASCII digits.
pub fn validate_phone_number(phone: &str) -> Result<(), RelayError> {
    if PHONE_NUMBER.is_match(phone) {
        Ok(())
    } else {
        Err(RelayError::InvalidPhoneNumber(phone.to_string()))
    }
}
