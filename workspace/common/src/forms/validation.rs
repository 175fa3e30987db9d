use std::borrow::Cow;
use validator::ValidationError;

/// Number of characters in a driver's license number.
pub const LICENSE_NUMBER_LENGTH: usize = 8;

/// Leading characters that must be uppercase ASCII letters.
const LICENSE_PREFIX_LENGTH: usize = 3;

fn license_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Checks that a license number has the `AAA99999` shape: three uppercase
/// ASCII letters followed by five ASCII digits.
///
/// Used as a `validator` custom rule by both driver forms.
pub fn validate_license_number(license_number: &str) -> Result<(), ValidationError> {
    let chars: Vec<char> = license_number.chars().collect();

    if chars.len() != LICENSE_NUMBER_LENGTH {
        return Err(license_error(
            "license_number_length",
            "License number should consist of 8 characters",
        ));
    }

    let (prefix, digits) = chars.split_at(LICENSE_PREFIX_LENGTH);

    if !prefix.iter().all(|c| c.is_ascii_uppercase()) {
        return Err(license_error(
            "license_number_prefix",
            "First 3 characters should be uppercase letters",
        ));
    }

    if !digits.iter().all(|c| c.is_ascii_digit()) {
        return Err(license_error(
            "license_number_digits",
            "Last 5 characters should be digits",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(value: &str) -> String {
        validate_license_number(value).unwrap_err().code.to_string()
    }

    #[test]
    fn test_valid_license_number() {
        assert!(validate_license_number("QWE12345").is_ok());
        assert!(validate_license_number("ABC00000").is_ok());
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        for value in ["", "Q", "QWE1234", "QWE123456", "QWERTYUIOP12345"] {
            assert_eq!(code_of(value), "license_number_length", "value: {value:?}");
        }
    }

    #[test]
    fn test_lowercase_prefix_is_rejected() {
        assert_eq!(code_of("qwe12345"), "license_number_prefix");
        assert_eq!(code_of("qWE12345"), "license_number_prefix");
        assert_eq!(code_of("QWe12345"), "license_number_prefix");
    }

    #[test]
    fn test_non_letter_prefix_is_rejected() {
        assert_eq!(code_of("QW123456"), "license_number_prefix");
        assert_eq!(code_of("Q-E12345"), "license_number_prefix");
        assert_eq!(code_of("ÄBC12345"), "license_number_prefix");
    }

    #[test]
    fn test_non_digit_suffix_is_rejected() {
        assert_eq!(code_of("QWE1234r"), "license_number_digits");
        assert_eq!(code_of("QWE 2345"), "license_number_digits");
        assert_eq!(code_of("QWEABCDE"), "license_number_digits");
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        // eight chars, more than eight bytes
        assert_eq!(code_of("QWE1234é"), "license_number_digits");
    }

    #[test]
    fn test_every_length_other_than_eight_fails() {
        for len in (0..20).filter(|len| *len != LICENSE_NUMBER_LENGTH) {
            let value: String = "ABC".chars().chain(std::iter::repeat('1')).take(len).collect();
            assert!(validate_license_number(&value).is_err(), "len {len}");
        }
    }

    #[test]
    fn test_error_carries_message() {
        let error = validate_license_number("QWE1234").unwrap_err();
        assert_eq!(
            error.message.as_deref(),
            Some("License number should consist of 8 characters")
        );
    }
}
