//! Request authentication headers.
//!
//! Credentials come from the environment. Header resolution prefers a
//! signed project request, then an account bearer token, then a bare
//! project key.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use wiro_core::signature::{compute_signature, current_nonce};

use crate::error::ApiError;

pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_NONCE: &str = "x-nonce";
pub const HEADER_SIGNATURE: &str = "x-signature";

/// Which auth scheme [`Credentials::headers`] selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Signature,
    Bearer,
    ApiKeyOnly,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Signature => "signature",
            AuthMode::Bearer => "bearer",
            AuthMode::ApiKeyOnly => "apikey-only",
        }
    }
}

/// Auth material for API calls. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub bearer_token: Option<String>,
}

impl Credentials {
    /// Load credentials from environment variables.
    ///
    /// | Env Var             | Purpose                          |
    /// |---------------------|----------------------------------|
    /// | `WIRO_API_KEY`      | Project API key                  |
    /// | `WIRO_API_SECRET`   | Project secret (signature mode)  |
    /// | `WIRO_BEARER_TOKEN` | Account token                    |
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_env("WIRO_API_KEY"),
            api_secret: non_empty_env("WIRO_API_SECRET"),
            bearer_token: non_empty_env("WIRO_BEARER_TOKEN"),
        }
    }

    /// Resolve auth headers with a fresh nonce.
    pub fn headers(&self) -> Result<(AuthMode, HeaderMap), ApiError> {
        self.headers_with_nonce(&current_nonce())
    }

    /// Resolve auth headers using the given nonce for signature mode.
    pub fn headers_with_nonce(&self, nonce: &str) -> Result<(AuthMode, HeaderMap), ApiError> {
        let api_key = self.api_key.as_deref().filter(|v| !v.trim().is_empty());
        let api_secret = self.api_secret.as_deref().filter(|v| !v.trim().is_empty());
        let bearer = self.bearer_token.as_deref().filter(|v| !v.trim().is_empty());

        let mut headers = HeaderMap::new();

        if let (Some(key), Some(secret)) = (api_key, api_secret) {
            let signature = compute_signature(key, secret, nonce);
            insert(&mut headers, HEADER_API_KEY, key)?;
            insert(&mut headers, HEADER_NONCE, nonce)?;
            insert(&mut headers, HEADER_SIGNATURE, &signature)?;
            return Ok((AuthMode::Signature, headers));
        }

        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::Auth("bearer token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
            return Ok((AuthMode::Bearer, headers));
        }

        if let Some(key) = api_key {
            insert(&mut headers, HEADER_API_KEY, key)?;
            return Ok((AuthMode::ApiKeyOnly, headers));
        }

        Err(ApiError::Auth(
            "no credentials found; set WIRO_API_KEY (+ WIRO_API_SECRET) or WIRO_BEARER_TOKEN".into(),
        ))
    }

    /// Auth for `/Project/List`: the account token when present (all of
    /// the account's projects), otherwise the project credentials.
    ///
    /// Also returns the `apikey` body value the call expects: empty under
    /// bearer auth, the project key otherwise.
    pub fn project_list_auth(&self) -> Result<(AuthMode, HeaderMap, String), ApiError> {
        self.project_list_auth_with_nonce(&current_nonce())
    }

    pub fn project_list_auth_with_nonce(
        &self,
        nonce: &str,
    ) -> Result<(AuthMode, HeaderMap, String), ApiError> {
        let account = Credentials {
            bearer_token: self.bearer_token.clone(),
            ..Default::default()
        };
        if let Ok((mode, headers)) = account.headers_with_nonce(nonce) {
            return Ok((mode, headers, String::new()));
        }
        let (mode, headers) = self.headers_with_nonce(nonce)?;
        let api_key = self.api_key.as_deref().unwrap_or_default().trim().to_string();
        Ok((mode, headers, api_key))
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| ApiError::Auth(format!("{name} is not a valid header value")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn creds(key: Option<&str>, secret: Option<&str>, bearer: Option<&str>) -> Credentials {
        Credentials {
            api_key: key.map(String::from),
            api_secret: secret.map(String::from),
            bearer_token: bearer.map(String::from),
        }
    }

    #[test]
    fn signature_mode_wins_when_secret_present() {
        let (mode, headers) = creds(Some("key"), Some("secret"), Some("tok"))
            .headers_with_nonce("1700000000")
            .unwrap();
        assert_eq!(mode, AuthMode::Signature);
        assert_eq!(headers[HEADER_API_KEY], "key");
        assert_eq!(headers[HEADER_NONCE], "1700000000");
        assert_eq!(
            headers[HEADER_SIGNATURE].to_str().unwrap(),
            compute_signature("key", "secret", "1700000000")
        );
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_used_without_secret() {
        let (mode, headers) = creds(Some("key"), None, Some("tok"))
            .headers_with_nonce("1")
            .unwrap();
        assert_eq!(mode, AuthMode::Bearer);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert!(headers.get(HEADER_API_KEY).is_none());
    }

    #[test]
    fn api_key_only_as_last_resort() {
        let (mode, headers) = creds(Some("key"), Some("  "), None)
            .headers_with_nonce("1")
            .unwrap();
        assert_eq!(mode, AuthMode::ApiKeyOnly);
        assert_eq!(headers[HEADER_API_KEY], "key");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn no_material_is_auth_error() {
        assert_matches!(
            creds(None, Some("secret"), None).headers_with_nonce("1"),
            Err(ApiError::Auth(_))
        );
    }

    #[test]
    fn project_listing_prefers_account_token() {
        let (mode, headers, api_key) = creds(Some("key"), Some("secret"), Some("tok"))
            .project_list_auth_with_nonce("1")
            .unwrap();
        assert_eq!(mode, AuthMode::Bearer);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(api_key, "");
    }

    #[test]
    fn project_listing_falls_back_to_project_key() {
        let (mode, headers, api_key) = creds(Some("key"), Some("secret"), None)
            .project_list_auth_with_nonce("1")
            .unwrap();
        assert_eq!(mode, AuthMode::Signature);
        assert_eq!(headers[HEADER_API_KEY], "key");
        assert_eq!(api_key, "key");

        assert_matches!(
            creds(None, None, Some(" ")).project_list_auth_with_nonce("1"),
            Err(ApiError::Auth(_))
        );
    }
}
