use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Append `path` to `base` without dropping the base's last segment.
pub fn join_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
}

/// Consume a failed response and return its status with the server's detail.
pub async fn error_detail(response: reqwest::Response) -> (u16, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status.as_u16(), detail_from_body(status, &body))
}

/// `{"detail": ...}` is the backend's error shape. Anything else gets a
/// generic message.
pub fn detail_from_body(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) if !detail.is_null() => detail.to_string(),
        _ => format!("request failed with status {}", status.as_u16()),
    }
}
