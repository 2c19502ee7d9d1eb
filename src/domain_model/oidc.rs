use crate::application_port::AuthError;
use url::Url;

/// Query parameters the identity provider appends when it redirects back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OidcCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl OidcCallback {
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        OidcCallback {
            code: Some(code.into()),
            state: Some(state.into()),
            error: None,
        }
    }

    /// Parse the callback out of the full redirect URL.
    pub fn from_redirect_url(redirect: &str) -> Result<Self, AuthError> {
        let url = Url::parse(redirect).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;

        let mut callback = OidcCallback::default();
        for (name, value) in url.query_pairs() {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match name.as_ref() {
                "code" => callback.code = value,
                "state" => callback.state = value,
                "error" => callback.error = value,
                _ => {}
            }
        }
        Ok(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_and_state_from_redirect() {
        let callback =
            OidcCallback::from_redirect_url("http://localhost/oidc/callback?state=s1&code=c1")
                .unwrap();

        assert_eq!(callback, OidcCallback::new("c1", "s1"));
    }

    #[test]
    fn keeps_provider_error_and_drops_empty_values() {
        let callback = OidcCallback::from_redirect_url(
            "http://localhost/oidc/callback?error=access_denied&code=",
        )
        .unwrap();

        assert_eq!(callback.error.as_deref(), Some("access_denied"));
        assert_eq!(callback.code, None);
        assert_eq!(callback.state, None);
    }

    #[test]
    fn rejects_relative_urls() {
        let err = OidcCallback::from_redirect_url("/oidc/callback?code=c1").unwrap_err();
        assert!(matches!(err, AuthError::InvalidUrl(_)));
    }
}
