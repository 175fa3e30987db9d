//! Password hashing, server-side sessions, and the login gate in front of
//! every page except the login page itself.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use model::entities::driver;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sea_orm::EntityTrait;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::schemas::AppState;

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_URL: &str = "/accounts/login/";
pub const LOGIN_REDIRECT_URL: &str = "/";

/// Characters left as-is in the `next` parameter; `/` stays readable.
const NEXT_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Server-side record behind a session cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub driver_id: i32,
    pub num_visits: u64,
}

/// The logged-in driver, placed in request extensions by [`require_login`].
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub driver: driver::Model,
    pub session_key: String,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Starts a session for `driver_id` and returns the cookie that carries it.
pub async fn start_session(state: &AppState, driver_id: i32) -> Cookie<'static> {
    let key = Uuid::new_v4().simple().to_string();
    state
        .sessions
        .insert(key.clone(), Session { driver_id, num_visits: 0 })
        .await;
    debug!("Started session for driver {}", driver_id);

    Cookie::build((SESSION_COOKIE, key))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Drops the session named by the cookie, if any, and expires the cookie.
pub async fn end_session(state: &AppState, jar: CookieJar) -> CookieJar {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.invalidate(cookie.value()).await;
        debug!("Ended session");
    }
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Bumps the visit counter of a session and returns the new value.
pub async fn record_visit(state: &AppState, session_key: &str) -> u64 {
    match state.sessions.get(session_key).await {
        Some(mut session) => {
            session.num_visits += 1;
            let visits = session.num_visits;
            state.sessions.insert(session_key.to_string(), session).await;
            visits
        }
        None => 0,
    }
}

/// Resolves the session cookie to an active driver.
async fn authenticate(state: &AppState, jar: &CookieJar) -> Result<Option<CurrentUser>, AppError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let session_key = cookie.value().to_string();
    let Some(session) = state.sessions.get(&session_key).await else {
        trace!("Unknown or expired session");
        return Ok(None);
    };

    match driver::Entity::find_by_id(session.driver_id).one(&state.db).await? {
        Some(driver) if driver.is_active => Ok(Some(CurrentUser { driver, session_key })),
        _ => {
            debug!("Session refers to a missing or inactive driver {}", session.driver_id);
            state.sessions.invalidate(&session_key).await;
            Ok(None)
        }
    }
}

/// `302 Found` to `location`.
pub fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

/// Login URL that returns to `uri` afterwards.
pub fn login_url_for(uri: &Uri) -> String {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{}?next={}", LOGIN_URL, utf8_percent_encode(next, NEXT_PARAM))
}

/// Only same-site absolute paths are followed after login.
pub fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

/// Middleware guarding every page that needs a logged-in driver.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, &jar).await {
        Ok(Some(current)) => {
            trace!("Request by {}", current.driver.username);
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        Ok(None) => {
            debug!("Anonymous request to {}, redirecting to login", request.uri());
            found(login_url_for(request.uri()))
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("test12password").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("test12password", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!verify_password("anything", "!"));
    }

    #[test]
    fn test_login_url_keeps_slashes() {
        let uri: Uri = "/cars/".parse().unwrap();
        assert_eq!(login_url_for(&uri), "/accounts/login/?next=/cars/");
    }

    #[test]
    fn test_login_url_encodes_query() {
        let uri: Uri = "/manufacturers/?name=a%20b&page=2".parse().unwrap();
        assert_eq!(
            login_url_for(&uri),
            "/accounts/login/?next=/manufacturers/%3Fname%3Da%2520b%26page%3D2"
        );
    }

    #[test]
    fn test_safe_redirects() {
        assert!(is_safe_redirect("/"));
        assert!(is_safe_redirect("/cars/?page=2"));
        assert!(!is_safe_redirect("//evil.example"));
        assert!(!is_safe_redirect("https://evil.example/"));
        assert!(!is_safe_redirect("/\\evil.example"));
        assert!(!is_safe_redirect(""));
    }
}
