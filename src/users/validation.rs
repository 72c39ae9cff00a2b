use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

/// `+` followed by one or more ASCII digits, nothing else.
pub fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^\+[0-9]+$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

/// Whitespace-only counts as empty.
pub fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub fn require_phone_format(phone: &str) -> Result<(), ApiError> {
    if !is_valid_phone(phone) {
        return Err(ApiError::validation("phone number format is not valid"));
    }
    Ok(())
}

pub fn same_phone(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plus_and_digits() {
        assert!(is_valid_phone("+1234567890"));
        assert!(is_valid_phone("+62234567890"));
        assert!(is_valid_phone("+0"));
    }

    #[test]
    fn rejects_everything_else() {
        for bad in [
            "",
            "+",
            "1234567890",
            "+1234567890a",
            "++123",
            "+-123",
            "+12 34",
            " +123",
            "+123\n",
            "+١٢٣",
        ] {
            assert!(!is_valid_phone(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn require_treats_blank_as_empty() {
        assert!(require("John", "full name").is_ok());
        let err = require("   ", "full name").unwrap_err();
        assert_eq!(err.to_string(), "full name cannot be empty");
    }

    #[test]
    fn same_phone_ignores_surrounding_whitespace() {
        assert!(same_phone(" +6281 ", "+6281"));
        assert!(!same_phone("+6281", "+6282"));
    }
}
