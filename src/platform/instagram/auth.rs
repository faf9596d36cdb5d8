use std::collections::HashMap;

use chrono::Utc;
use reqwest::{
    cookie::{CookieStore, Jar},
    header::{HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{extract_csrf_token, AuthenticationError, InstagramError};
use crate::service::http::HttpService;

const LOGIN_PATH: &str = "api/v1/web/accounts/login/ajax/";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    authenticated: Option<bool>,
    #[serde(default)]
    user: Option<bool>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    two_factor_required: Option<bool>,
    #[serde(default)]
    checkpoint_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SerializableCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    #[serde(default)]
    pub username: Option<String>,
    pub cookies: Vec<SerializableCookie>,
}

/// On-disk session shapes: our own `SessionData`, or a bare
/// `{ "cookie name": "value" }` map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionFile {
    Full(SessionData),
    Flat(HashMap<String, String>),
}

impl From<SessionFile> for SessionData {
    fn from(file: SessionFile) -> Self {
        match file {
            SessionFile::Full(data) => data,
            SessionFile::Flat(map) => SessionData {
                username: None,
                cookies: map
                    .into_iter()
                    .map(|(name, value)| SerializableCookie {
                        name,
                        value,
                        domain: None,
                        path: default_cookie_path(),
                    })
                    .collect(),
            },
        }
    }
}

fn jar_cookies(jar: &Jar, base_url: &Url) -> Vec<(String, String)> {
    jar.cookies(base_url)
        .and_then(|header| header.to_str().ok().map(str::to_string))
        .map(|raw| {
            raw.split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Restores cookies from a session file into `jar`. Returns the username
/// stored alongside them, if any.
pub async fn load_session_file(path: &str, jar: &Jar, base_url: &Url) -> Result<Option<String>, AuthenticationError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AuthenticationError::SessionFile(format!("Failed to read {}: {}", path, e)))?;

    let file: SessionFile = serde_json::from_str(&raw)
        .map_err(|e| AuthenticationError::SessionFile(format!("Failed to parse {}: {}", path, e)))?;
    let session: SessionData = file.into();

    if !session.cookies.iter().any(|c| c.name == "sessionid") {
        return Err(AuthenticationError::SessionFile(format!(
            "No sessionid cookie in {}",
            path
        )));
    }

    // Cookies are pinned to the configured host rather than the domain saved
    // in the file, so the jar always sends them to the endpoint we query.
    for cookie in &session.cookies {
        jar.add_cookie_str(&format!("{}={}; Path={}", cookie.name, cookie.value, cookie.path), base_url);
    }

    Ok(session.username)
}

pub async fn save_session_file(
    path: &str,
    username: &str,
    jar: &Jar,
    base_url: &Url,
) -> Result<(), AuthenticationError> {
    let session = SessionData {
        username: Some(username.to_string()),
        cookies: jar_cookies(jar, base_url)
            .into_iter()
            .map(|(name, value)| SerializableCookie {
                name,
                value,
                domain: base_url.host_str().map(str::to_string),
                path: default_cookie_path(),
            })
            .collect(),
    };

    let serialized = serde_json::to_string_pretty(&session)
        .map_err(|e| AuthenticationError::SessionFile(format!("Failed to serialize session: {}", e)))?;

    tokio::fs::write(path, serialized)
        .await
        .map_err(|e| AuthenticationError::SessionFile(format!("Failed to write {}: {}", path, e)))?;

    info!("Saved Instagram session to {}", path);
    Ok(())
}

async fn fetch_csrf_token(http: &HttpService, base_url: &Url) -> Result<String, InstagramError> {
    let response = http.get(base_url.clone()).await?;

    if let Some(cookie) = response.cookies().find(|c| c.name() == "csrftoken") {
        return Ok(cookie.value().to_string());
    }

    let body = response.text().await?;

    jar_cookies(&http.cookie_jar(), base_url)
        .into_iter()
        .find(|(name, _)| name == "csrftoken")
        .map(|(_, value)| value)
        .or_else(|| extract_csrf_token(&body))
        .ok_or_else(|| AuthenticationError::LoginFailed("Failed to obtain CSRF token".to_string()).into())
}

fn check_login_response(login_response: LoginResponse, username: &str) -> Result<(), AuthenticationError> {
    if login_response.two_factor_required.unwrap_or(false) {
        return Err(AuthenticationError::TwoFactorRequired);
    }

    if let Some(checkpoint_url) = login_response.checkpoint_url {
        return Err(AuthenticationError::CheckpointRequired(checkpoint_url));
    }

    if login_response.status.as_deref() == Some("fail") {
        return Err(AuthenticationError::LoginFailed(
            login_response
                .message
                .unwrap_or_else(|| "Instagram rejected the login request".to_string()),
        ));
    }

    if !login_response.authenticated.unwrap_or(false) {
        if login_response.user.unwrap_or(false) {
            return Err(AuthenticationError::BadCredentials);
        }
        return Err(AuthenticationError::LoginFailed(format!("User {} does not exist", username)));
    }

    info!(
        "Login successful for user: {}, user_id: {:?}",
        username, login_response.user_id
    );
    Ok(())
}

/// Web login: visit the homepage for a csrf token, then post the
/// credentials. Cookies land in the service's jar.
pub async fn login(http: &HttpService, base_url: &Url, username: &str, password: &str) -> Result<(), InstagramError> {
    let csrf_token = fetch_csrf_token(http, base_url).await?;

    let enc_password = format!("#PWD_INSTAGRAM_BROWSER:0:{}:{}", Utc::now().timestamp(), password);

    let form_data = [
        ("username", username),
        ("enc_password", enc_password.as_str()),
        ("queryParams", "{}"),
        ("optIntoOneTap", "false"),
        ("trustedDeviceRecords", "{}"),
    ];

    let mut headers = HeaderMap::new();
    headers.insert(
        "X-CSRFToken",
        HeaderValue::from_str(&csrf_token)
            .map_err(|_| AuthenticationError::LoginFailed("Invalid CSRF token".to_string()))?,
    );
    headers.insert("X-IG-WWW-Claim", HeaderValue::from_static("0"));

    let login_url = base_url
        .join(LOGIN_PATH)
        .map_err(|e| InstagramError::Unexpected(format!("Failed to build login URL: {}", e)))?;

    let response = http.post_form(login_url, &form_data, headers).await?;
    let status = response.status();
    let body = response.text().await?;

    let login_response: LoginResponse = serde_json::from_str(&body).map_err(|e| {
        AuthenticationError::LoginFailed(format!("Unexpected login response (HTTP {}): {}", status, e))
    })?;

    check_login_response(login_response, username)?;

    if !jar_cookies(&http.cookie_jar(), base_url)
        .iter()
        .any(|(name, _)| name == "sessionid")
    {
        return Err(AuthenticationError::LoginFailed("No sessionid cookie after login".to_string()).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        http::{header, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Form, Json, Router,
    };
    use serde_json::json;

    use super::*;
    use crate::utils::test::spawn_upstream;

    fn http_for(base: &Url) -> HttpService {
        HttpService::new(base, Duration::from_secs(5), Duration::from_secs(5), None).unwrap()
    }

    async fn login_endpoint(Form(form): Form<HashMap<String, String>>) -> axum::response::Response {
        match (form.get("username").map(String::as_str), form.get("enc_password")) {
            (Some("alice"), Some(password)) if password.ends_with(":hunter22") => (
                [(header::SET_COOKIE, "sessionid=sess-123; Path=/")],
                Json(json!({ "authenticated": true, "user": true, "user_id": "42", "status": "ok" })),
            )
                .into_response(),
            (Some("alice"), _) => Json(json!({ "authenticated": false, "user": true, "status": "ok" })).into_response(),
            (Some("twofa"), _) => Json(json!({ "two_factor_required": true, "status": "fail" })).into_response(),
            _ => (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad", "status": "fail" }))).into_response(),
        }
    }

    async fn mock_instagram() -> Url {
        let app = Router::new()
            .route(
                "/",
                get(|| async { ([(header::SET_COOKIE, "csrftoken=csrf-abc; Path=/")], "<html></html>") }),
            )
            .route("/api/v1/web/accounts/login/ajax/", post(login_endpoint));
        let addr = spawn_upstream(app).await;
        Url::parse(&format!("http://{}/", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_login_success_and_session_roundtrip() {
        let base = mock_instagram().await;
        let http = http_for(&base);

        login(&http, &base, "alice", "hunter22").await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session-alice");
        let path = path.to_str().unwrap();

        save_session_file(path, "alice", &http.cookie_jar(), &base).await.unwrap();

        let restored = Jar::default();
        let username = load_session_file(path, &restored, &base).await.unwrap();

        assert_eq!(username.as_deref(), Some("alice"));
        let cookies = jar_cookies(&restored, &base);
        assert!(cookies.contains(&("sessionid".to_string(), "sess-123".to_string())));
        assert!(cookies.contains(&("csrftoken".to_string(), "csrf-abc".to_string())));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let base = mock_instagram().await;
        let http = http_for(&base);

        assert!(matches!(
            login(&http, &base, "alice", "wrong").await,
            Err(InstagramError::AuthenticationError(AuthenticationError::BadCredentials))
        ));
        assert!(matches!(
            login(&http, &base, "twofa", "whatever").await,
            Err(InstagramError::AuthenticationError(AuthenticationError::TwoFactorRequired))
        ));
        assert!(matches!(
            login(&http, &base, "nobody", "whatever").await,
            Err(InstagramError::AuthenticationError(AuthenticationError::LoginFailed(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_flat_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session-flat");
        std::fs::write(&path, r#"{"sessionid": "flat-1", "csrftoken": "tok"}"#).unwrap();

        let base = Url::parse("https://www.instagram.com/").unwrap();
        let jar = Jar::default();
        let username = load_session_file(path.to_str().unwrap(), &jar, &base).await.unwrap();

        assert_eq!(username, None);
        assert!(jar_cookies(&jar, &base).contains(&("sessionid".to_string(), "flat-1".to_string())));
    }

    #[tokio::test]
    async fn test_load_broken_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = Url::parse("https://www.instagram.com/").unwrap();

        let garbage = dir.path().join("garbage");
        std::fs::write(&garbage, "not json at all").unwrap();
        assert!(load_session_file(garbage.to_str().unwrap(), &Jar::default(), &base)
            .await
            .is_err());

        let no_session = dir.path().join("no-session");
        std::fs::write(&no_session, r#"{"csrftoken": "tok"}"#).unwrap();
        assert!(load_session_file(no_session.to_str().unwrap(), &Jar::default(), &base)
            .await
            .is_err());

        let missing = dir.path().join("missing");
        assert!(load_session_file(missing.to_str().unwrap(), &Jar::default(), &base)
            .await
            .is_err());
    }
}
