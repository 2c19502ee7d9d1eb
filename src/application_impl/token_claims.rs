use crate::application_port::AuthError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: f64,
}

/// Read the `exp` claim of a JWT access token.
///
/// The signature is NOT checked: the result only drives the client's own
/// refresh timing, the server still validates every token it receives.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::Decode(e.to_string()))?;

    let exp = data.claims.exp;
    if !exp.is_finite() {
        return Err(AuthError::Decode("exp is not a finite number".to_string()));
    }
    DateTime::from_timestamp(exp.trunc() as i64, 0)
        .ok_or_else(|| AuthError::Decode(format!("exp out of range: {exp}")))
}
