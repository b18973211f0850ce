// Validation utilities module
// Custom validators for customer lookup parameters

use validator::ValidationError;

use crate::analytics::identity::normalize_phone;

pub const MIN_PHONE_DIGITS: usize = 8;
pub const MAX_PHONE_DIGITS: usize = 15;

/// Validates that a phone number carries 8-15 digits once punctuation is stripped
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = normalize_phone(phone).len();
    if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some("Phone must contain between 8 and 15 digits".into());
        Err(error)
    }
}

/// Validates that at least one identity field is present and non-blank
pub fn validate_identity_fields(
    customer_id_present: bool,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), ValidationError> {
    let has_text = |value: Option<&str>| value.is_some_and(|v| !v.trim().is_empty());
    if customer_id_present || has_text(email) || has_text(phone) {
        Ok(())
    } else {
        let mut error = ValidationError::new("missing_identity");
        error.message = Some("One of customer_id, email or phone is required".into());
        Err(error)
    }
}
