use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// What a client needs to render a search input: which query parameter it
/// binds to, the placeholder, and the current (cleaned) value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchFormState {
    pub field: String,
    pub placeholder: String,
    pub value: String,
}

/// A single-field, always-valid search form.
pub trait SearchForm {
    /// Query parameter the form binds to.
    const FIELD: &'static str;
    /// Placeholder shown in the empty input.
    const PLACEHOLDER: &'static str;

    /// Raw submitted value, if any.
    fn raw(&self) -> Option<&str>;

    /// The trimmed input, or an empty string when nothing was submitted.
    fn cleaned(&self) -> String {
        self.raw().map(str::trim).unwrap_or_default().to_string()
    }

    fn state(&self) -> SearchFormState {
        SearchFormState {
            field: Self::FIELD.to_string(),
            placeholder: Self::PLACEHOLDER.to_string(),
            value: self.cleaned(),
        }
    }
}

/// Filters manufacturers by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ManufacturerSearchForm {
    /// Case-insensitive substring of the manufacturer name
    pub name: Option<String>,
}

impl SearchForm for ManufacturerSearchForm {
    const FIELD: &'static str = "name";
    const PLACEHOLDER: &'static str = "Search by manufacturer";

    fn raw(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Filters cars by model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CarSearchForm {
    /// Case-insensitive substring of the car model
    pub model: Option<String>,
}

impl SearchForm for CarSearchForm {
    const FIELD: &'static str = "model";
    const PLACEHOLDER: &'static str = "Search by model";

    fn raw(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// Filters drivers by username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DriverSearchForm {
    /// Case-insensitive substring of the driver username
    pub username: Option<String>,
}

impl SearchForm for DriverSearchForm {
    const FIELD: &'static str = "username";
    const PLACEHOLDER: &'static str = "Search by username";

    fn raw(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufacturer_search_form() {
        let form = ManufacturerSearchForm { name: Some("test".to_string()) };
        assert_eq!(form.cleaned(), "test");
        assert_eq!(ManufacturerSearchForm::PLACEHOLDER, "Search by manufacturer");
    }

    #[test]
    fn test_car_search_form() {
        let form = CarSearchForm { model: Some("test_model".to_string()) };
        assert_eq!(form.cleaned(), "test_model");
        assert_eq!(CarSearchForm::PLACEHOLDER, "Search by model");
    }

    #[test]
    fn test_driver_search_form() {
        let form = DriverSearchForm { username: Some("user1_username".to_string()) };
        assert_eq!(form.cleaned(), "user1_username");
        assert_eq!(DriverSearchForm::PLACEHOLDER, "Search by username");
    }

    #[test]
    fn test_cleaned_value_is_trimmed() {
        let form = CarSearchForm { model: Some("  Golf \t".to_string()) };
        assert_eq!(form.cleaned(), "Golf");
    }

    #[test]
    fn test_missing_value_cleans_to_empty() {
        assert_eq!(DriverSearchForm::default().cleaned(), "");
    }

    #[test]
    fn test_state_describes_input() {
        let form = ManufacturerSearchForm { name: Some(" bmw ".to_string()) };
        assert_eq!(
            form.state(),
            SearchFormState {
                field: "name".to_string(),
                placeholder: "Search by manufacturer".to_string(),
                value: "bmw".to_string(),
            }
        );
    }

    #[test]
    fn test_deserializes_from_query_shape() {
        let form: DriverSearchForm = serde_json::from_str(r#"{"username":"joe"}"#).unwrap();
        assert_eq!(form.cleaned(), "joe");
        let empty: DriverSearchForm = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.raw(), None);
    }
}
