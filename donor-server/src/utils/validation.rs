//! Input validation helpers
//!
//! Text length limits and the checks handlers run before touching the
//! database. SQLite TEXT has no built-in length enforcement.

use crate::utils::AppError;

/// Person names: donor, patient, requester
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: phone, blood group, browser id
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Location parts: division, district, upazila, area
pub const MAX_LOCATION_LEN: usize = 120;

/// Upper bound on blood bags for one patient
pub const MAX_BLOOD_BAGS: i64 = 20;

/// Upper bound on a manual disable, in days
pub const MAX_DISABLE_DAYS: i64 = 3650;

/// Blood groups the platform recognises
pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a blood group. Empty is allowed where the field is optional.
pub fn validate_blood_group(value: &str, field: &str, allow_empty: bool) -> Result<(), AppError> {
    let v = value.trim();
    if v.is_empty() && allow_empty {
        return Ok(());
    }
    if !BLOOD_GROUPS.contains(&v) {
        return Err(AppError::validation(format!(
            "{field} must be one of {}",
            BLOOD_GROUPS.join(", ")
        )));
    }
    Ok(())
}

/// Validate the number of blood bags requested
pub fn validate_blood_bags(value: i64) -> Result<(), AppError> {
    if !(1..=MAX_BLOOD_BAGS).contains(&value) {
        return Err(AppError::validation(format!(
            "bloodBagsNeeded must be between 1 and {MAX_BLOOD_BAGS}, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_and_long() {
        assert!(validate_required_text("Karim", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_required_text(&long, "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn optional_text_only_checks_length() {
        assert!(validate_optional_text(&None, "phone", 5).is_ok());
        assert!(validate_optional_text(&Some("12345".into()), "phone", 5).is_ok());
        assert!(validate_optional_text(&Some("123456".into()), "phone", 5).is_err());
    }

    #[test]
    fn blood_group_checks() {
        assert!(validate_blood_group("AB-", "bloodGroup", false).is_ok());
        assert!(validate_blood_group(" O+ ", "bloodGroup", false).is_ok());
        assert!(validate_blood_group("", "bloodGroup", true).is_ok());
        assert!(validate_blood_group("", "bloodGroup", false).is_err());
        assert!(validate_blood_group("C+", "bloodGroup", true).is_err());
    }

    #[test]
    fn blood_bag_bounds() {
        assert!(validate_blood_bags(1).is_ok());
        assert!(validate_blood_bags(MAX_BLOOD_BAGS).is_ok());
        assert!(validate_blood_bags(0).is_err());
        assert!(validate_blood_bags(MAX_BLOOD_BAGS + 1).is_err());
    }
}
