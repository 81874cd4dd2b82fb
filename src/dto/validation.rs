//! Validation helpers for DTOs.

use validator::ValidationError;

use super::parse_system_time;

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME_LEN: usize = 64;

/// Validates that a player name is non-blank and at most [`MAX_PLAYER_NAME_LEN`] characters.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Ana")   // Ok
/// validate_player_name("   ")   // Err - blank
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }

    let length = trimmed.chars().count();
    if length > MAX_PLAYER_NAME_LEN {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_LEN} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a timestamp is an RFC 3339 date-time.
pub fn validate_timestamp(raw: &str) -> Result<(), ValidationError> {
    parse_system_time(raw).map(|_| ()).map_err(|parse_err| {
        let mut err = ValidationError::new("timestamp_format");
        err.message = Some(format!("Expected an RFC 3339 timestamp: {parse_err}").into());
        err
    })
}
