//! Input forms. Each form is a plain struct deserialized from a request and
//! checked with `validator`; database-backed checks (uniqueness, foreign keys)
//! happen in the service layer on top of these.

mod search;
mod validation;

pub use search::{CarSearchForm, DriverSearchForm, ManufacturerSearchForm, SearchForm, SearchFormState};
pub use validation::{LICENSE_NUMBER_LENGTH, validate_license_number};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

/// Field name to human-readable messages, as reported back to the submitter.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Flattens `validator` errors into per-field messages. Errors without an
/// explicit message fall back to their code.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Create or update a manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct ManufacturerForm {
    /// Manufacturer name (unique)
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Country of origin
    #[validate(length(min = 1, max = 255))]
    pub country: String,
}

/// Create or update a car together with its assigned drivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct CarForm {
    /// Car model
    #[validate(length(min = 1, max = 255))]
    pub model: String,
    /// Manufacturer ID (required)
    pub manufacturer_id: i32,
    /// IDs of the drivers assigned to this car
    #[serde(default)]
    pub drivers: Vec<i32>,
}

/// Register a new driver account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct DriverCreationForm {
    /// Username (unique)
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    /// License number in the form AAA99999 (unique)
    #[validate(custom(function = "validate_license_number"))]
    pub license_number: String,
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password1: String,
    #[validate(must_match(
        other = "password1",
        code = "password_mismatch",
        message = "The two password fields didn't match."
    ))]
    pub password2: String,
}

/// Replace a driver's license number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct DriverLicenseUpdateForm {
    /// License number in the form AAA99999 (unique)
    #[validate(custom(function = "validate_license_number"))]
    pub license_number: String,
}

/// Credentials posted to the login page.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Where to go after a successful login
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVALID_LICENSE_NUMBERS: [&str; 4] = ["QWE1234", "qWE12345", "QWE1234r", "QW123456"];

    fn creation_form() -> DriverCreationForm {
        DriverCreationForm {
            username: "user1_username".to_string(),
            first_name: "user1_fname".to_string(),
            last_name: "user1_lname".to_string(),
            license_number: "QWE12345".to_string(),
            password1: "test12password".to_string(),
            password2: "test12password".to_string(),
        }
    }

    #[test]
    fn test_driver_creation_form() {
        assert!(creation_form().validate().is_ok());
    }

    #[test]
    fn test_driver_creation_form_with_invalid_license_number() {
        for invalid in INVALID_LICENSE_NUMBERS {
            let form = DriverCreationForm {
                license_number: invalid.to_string(),
                ..creation_form()
            };
            let errors = form.validate().unwrap_err();
            assert!(
                field_errors(&errors).contains_key("license_number"),
                "{invalid} should be rejected"
            );
        }
    }

    #[test]
    fn test_driver_creation_form_password_mismatch() {
        let form = DriverCreationForm {
            password2: "something-else".to_string(),
            ..creation_form()
        };
        let errors = field_errors(&form.validate().unwrap_err());
        assert_eq!(
            errors.get("password2"),
            Some(&vec!["The two password fields didn't match.".to_string()])
        );
    }

    #[test]
    fn test_driver_creation_form_short_password() {
        let form = DriverCreationForm {
            password1: "short".to_string(),
            password2: "short".to_string(),
            ..creation_form()
        };
        let errors = field_errors(&form.validate().unwrap_err());
        assert!(errors.contains_key("password1"));
        assert!(!errors.contains_key("password2"));
    }

    #[test]
    fn test_driver_license_update_form() {
        let form = DriverLicenseUpdateForm { license_number: "QWE12345".to_string() };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_driver_license_update_form_with_invalid_license_number() {
        for invalid in INVALID_LICENSE_NUMBERS {
            let form = DriverLicenseUpdateForm { license_number: invalid.to_string() };
            assert!(form.validate().is_err(), "{invalid} should be rejected");
        }
    }

    #[test]
    fn test_license_error_message_is_reported() {
        let form = DriverLicenseUpdateForm { license_number: "qwe12345".to_string() };
        let errors = field_errors(&form.validate().unwrap_err());
        assert_eq!(
            errors["license_number"],
            vec!["First 3 characters should be uppercase letters".to_string()]
        );
    }

    #[test]
    fn test_car_form() {
        let form: CarForm = serde_json::from_value(serde_json::json!({
            "model": "test_model",
            "manufacturer_id": 1,
            "drivers": [1, 2],
        }))
        .unwrap();
        assert!(form.validate().is_ok());
        assert_eq!(form.drivers, vec![1, 2]);
    }

    #[test]
    fn test_car_form_drivers_default_to_empty() {
        let form: CarForm =
            serde_json::from_str(r#"{"model":"test_model","manufacturer_id":1}"#).unwrap();
        assert!(form.drivers.is_empty());
    }

    #[test]
    fn test_manufacturer_form_requires_name() {
        let form = ManufacturerForm { name: String::new(), country: "Germany".to_string() };
        let errors = field_errors(&form.validate().unwrap_err());
        assert_eq!(errors["name"], vec!["length".to_string()]);
    }
}
