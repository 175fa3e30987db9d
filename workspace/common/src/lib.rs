//! Framework-independent pieces shared by the taxi service and its storage
//! layer: input forms with their validation rules, and paginator arithmetic.
//! Nothing here touches the database or HTTP.

pub mod forms;
pub mod pagination;

pub use forms::{
    CarForm, CarSearchForm, DriverCreationForm, DriverLicenseUpdateForm, DriverSearchForm,
    LoginForm, ManufacturerForm, ManufacturerSearchForm, SearchForm, SearchFormState,
    validate_license_number,
};
pub use pagination::{PAGINATE_BY, PageInfo, PageQuery, PageRequest, Paginator};
