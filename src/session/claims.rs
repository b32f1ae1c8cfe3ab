//! Best-effort reading of identity token claims.
//!
//! Nothing here verifies a signature or an expiry. The email is for display
//! only; the product API is the sole judge of the token.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

/// base64url, accepting tokens with or without padding
const TOKEN_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub(crate) enum ClaimsError {
    #[error("token has no payload segment")]
    MissingPayload,

    #[error("payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("payload is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no email claim")]
    MissingEmail,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    email: Option<String>,
}

/// Pull the `email` claim out of a JWT-shaped token
pub(crate) fn decode_email(token: &str) -> Result<String, ClaimsError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(ClaimsError::MissingPayload)?;

    let bytes = TOKEN_SEGMENT.decode(payload)?;
    let claims: IdTokenClaims = serde_json::from_slice(&bytes)?;

    claims
        .email
        .filter(|email| !email.is_empty())
        .ok_or(ClaimsError::MissingEmail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn mint(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"not-the-provider-key"),
        )
        .unwrap()
    }

    #[test]
    fn reads_email_from_signed_token() {
        let token = mint(json!({
            "sub": "0f3c",
            "email": "u@x.com",
            "token_use": "id",
            "exp": 1
        }));

        assert_eq!(decode_email(&token).unwrap(), "u@x.com");
    }

    #[test]
    fn accepts_padded_segments() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"email":"a@b.co"}"#);
        let token = format!("h.{}.s", payload);

        assert_eq!(decode_email(&token).unwrap(), "a@b.co");
    }

    #[test]
    fn opaque_token_has_no_payload() {
        assert!(matches!(
            decode_email("abc"),
            Err(ClaimsError::MissingPayload)
        ));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        assert!(matches!(
            decode_email("h.!!!.s"),
            Err(ClaimsError::Encoding(_))
        ));

        let not_json = TOKEN_SEGMENT.encode(b"plain text");
        assert!(matches!(
            decode_email(&format!("h.{}.s", not_json)),
            Err(ClaimsError::Json(_))
        ));
    }

    #[test]
    fn token_without_email_claim() {
        let token = mint(json!({ "sub": "0f3c", "exp": 1 }));
        assert!(matches!(decode_email(&token), Err(ClaimsError::MissingEmail)));
    }
}
