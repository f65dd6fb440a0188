//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a room identifier is exactly 6 ASCII digits.
///
/// # Examples
///
/// ```ignore
/// validate_room_id("472913") // Ok
/// validate_room_id("4729")   // Err - too short
/// validate_room_id("47a913") // Err - not a digit
/// ```
pub fn validate_room_id(id: &str) -> Result<(), ValidationError> {
    if id.len() != 6 {
        let mut err = ValidationError::new("room_id_length");
        err.message =
            Some(format!("Room ID must be exactly 6 characters (got {})", id.len()).into());
        return Err(err);
    }

    if !id.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("room_id_format");
        err.message = Some("Room ID must contain only ASCII digits".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_id_valid() {
        assert!(validate_room_id("000000").is_ok());
        assert!(validate_room_id("123456").is_ok());
        assert!(validate_room_id("999999").is_ok());
    }

    #[test]
    fn test_validate_room_id_invalid_length() {
        assert!(validate_room_id("12345").is_err()); // too short
        assert!(validate_room_id("1234567").is_err()); // too long
        assert!(validate_room_id("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_id_invalid_format() {
        assert!(validate_room_id("12345a").is_err()); // letter
        assert!(validate_room_id("12 456").is_err()); // space
        assert!(validate_room_id("１２３４５６").is_err()); // full-width digits
    }
}
