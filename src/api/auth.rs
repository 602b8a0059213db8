//! Authentication
//!
//! Holds the bearer token used for API calls. The token either comes
//! pre-issued (flag, environment, config) or is obtained through the
//! OAuth2 password flow at `/login/access-token`.

use super::error::{ApiError, ApiResult};
use super::http::ApiHttpClient;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Login details for the password flow
#[derive(Clone)]
pub struct LoginDetails {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginDetails")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Credentials holder with token caching
#[derive(Clone, Default)]
pub struct Credentials {
    login: Option<LoginDetails>,
    token_cache: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    /// Use a token issued elsewhere
    pub fn with_token(token: &str) -> Self {
        Self {
            login: None,
            token_cache: Arc::new(RwLock::new(Some(token.to_string()))),
        }
    }

    /// Log in lazily with email and password
    pub fn with_login(login: LoginDetails) -> Self {
        Self {
            login: Some(login),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    pub fn has_login(&self) -> bool {
        self.login.is_some()
    }

    /// Get the cached token, logging in first if needed
    pub async fn get_token(&self, http: &ApiHttpClient, login_url: &str) -> ApiResult<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(token) = cache.as_ref() {
                return Ok(token.clone());
            }
        }

        let Some(login) = &self.login else {
            return Err(ApiError::Unauthenticated);
        };

        // Callers that missed the cache together wait here for one login
        let mut cache = self.token_cache.write().await;
        if let Some(token) = cache.as_ref() {
            return Ok(token.clone());
        }

        let token = request_token(http, login_url, login).await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next call logs in again
    pub async fn clear(&self) {
        if self.login.is_some() {
            *self.token_cache.write().await = None;
        }
    }
}

async fn request_token(
    http: &ApiHttpClient,
    login_url: &str,
    login: &LoginDetails,
) -> ApiResult<String> {
    tracing::info!("Logging in as {}", login.email);

    let response = http
        .post_form(
            login_url,
            &[("username", login.email.as_str()), ("password", login.password.as_str())],
        )
        .await?;

    response
        .get("access_token")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::Decode("login response has no access_token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_is_returned_without_login() {
        let creds = Credentials::with_token("abc");
        let http = ApiHttpClient::new().unwrap();
        let token = creds.get_token(&http, "http://127.0.0.1:9/login").await;
        assert_eq!(token.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_missing_credentials_is_unauthenticated() {
        let creds = Credentials::default();
        let http = ApiHttpClient::new().unwrap();
        let err = creds
            .get_token(&http, "http://127.0.0.1:9/login")
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Unauthenticated);
    }

    #[test]
    fn test_debug_hides_password() {
        let login = LoginDetails {
            email: "admin@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{:?}", login).contains("hunter22"));
    }
}
