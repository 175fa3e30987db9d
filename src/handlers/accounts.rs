use axum::{
    extract::{Query, State},
    response::{Json, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use axum_valid::Valid;
use chrono::Utc;
use common::LoginForm;
use model::entities::driver;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{self, LOGIN_REDIRECT_URL, LOGIN_URL};
use crate::error::AppError;
use crate::schemas::{AppState, ErrorResponse};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginPageQuery {
    /// Path to return to after logging in
    pub next: Option<String>,
}

/// What the login page renders
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginPage {
    /// Form fields, in display order
    pub fields: Vec<String>,
    pub next: Option<String>,
}

/// Describe the login form
#[utoipa::path(
    get,
    path = "/accounts/login/",
    params(LoginPageQuery),
    responses(
        (status = 200, description = "Login form", body = LoginPage)
    ),
    tag = "accounts"
)]
#[instrument]
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        fields: vec!["username".to_string(), "password".to_string()],
        next: query.next.filter(|next| auth::is_safe_redirect(next)),
    })
}

/// Log in with username and password
///
/// On success the session cookie is set and the client is sent to `next`
/// (when it is a local path) or to the index.
#[utoipa::path(
    post,
    path = "/accounts/login/",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in; redirect to `next` or `/`"),
        (status = 400, description = "Missing fields or wrong credentials", body = ErrorResponse)
    ),
    tag = "accounts"
)]
#[instrument(skip(state, jar, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Valid(Form(form)): Valid<Form<LoginForm>>,
) -> Result<(CookieJar, Response), AppError> {
    debug!("Login attempt");

    let driver = driver::Entity::find()
        .filter(driver::Column::Username.eq(form.username.as_str()))
        .one(&state.db)
        .await?;

    let driver = match driver {
        Some(driver) if driver.is_active && auth::verify_password(&form.password, &driver.password) => driver,
        _ => {
            warn!("Rejected login");
            return Err(AppError::InvalidCredentials);
        }
    };

    let mut active = driver.into_active_model();
    active.last_login = Set(Some(Utc::now()));
    let driver = active.update(&state.db).await?;

    let cookie = auth::start_session(&state, driver.id).await;
    let target = form
        .next
        .filter(|next| auth::is_safe_redirect(next))
        .unwrap_or_else(|| LOGIN_REDIRECT_URL.to_string());

    info!("Driver {} logged in", driver.id);
    Ok((jar.add(cookie), auth::found(target)))
}

/// Log out and return to the login page
#[utoipa::path(
    post,
    path = "/accounts/logout/",
    responses(
        (status = 302, description = "Session dropped; redirect to the login page")
    ),
    tag = "accounts"
)]
#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Response) {
    let jar = auth::end_session(&state, jar).await;
    (jar, auth::found(LOGIN_URL))
}
