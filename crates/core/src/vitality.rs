//! Vitality label values.

use crate::error::CoreError;

/// Marker value for a photo whose vitality cannot be judged.
pub const VITALITY_UNDIAGNOSABLE: i32 = -1;

/// All accepted vitality values, in the order statistics are reported.
pub const VALID_VITALITY_VALUES: [i32; 6] = [1, 2, 3, 4, 5, VITALITY_UNDIAGNOSABLE];

/// Validate that `value` is 1-5 or -1.
pub fn validate_vitality_value(value: i32) -> Result<(), CoreError> {
    if VALID_VITALITY_VALUES.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "vitality_value must be -1 or 1-5, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_scale_and_undiagnosable() {
        for v in [-1, 1, 2, 3, 4, 5] {
            assert!(validate_vitality_value(v).is_ok(), "{v} should be valid");
        }
    }

    #[test]
    fn rejects_out_of_range() {
        for v in [0, 6, -2, 100] {
            assert!(validate_vitality_value(v).is_err(), "{v} should be invalid");
        }
    }
}
