//! Session tokens.
//!
//! A token is `base64(session_id ":" issued_at_ms) "." hex(hmac_sha256(secret, data))`.
//! Tokens are stateless: validity is the signature plus an optional age check
//! against the embedded timestamp.

use crate::config::{GateError, Result};
use crate::core::clock::now_ms;
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Identity carried by a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub session_id: String,
    pub issued_at_ms: u64,
}

/// Why a token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("Token is required")]
    MissingToken,
    #[error("Secret is required")]
    MissingSecret,
    #[error("Invalid token format")]
    InvalidFormat,
    #[error("Invalid base64 encoding")]
    InvalidEncoding,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
}

/// Result of an age check. Invalid tokens count as expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAge {
    Fresh { age_ms: i64 },
    Expired { age_ms: i64 },
    Rejected(TokenRejection),
}

impl TokenAge {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        !matches!(self, Self::Fresh { .. })
    }

    #[must_use]
    pub fn age_ms(&self) -> Option<i64> {
        match self {
            Self::Fresh { age_ms } | Self::Expired { age_ms } => Some(*age_ms),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn rejection(&self) -> Option<TokenRejection> {
        match self {
            Self::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Computes the lowercase hex HMAC-SHA256 of `data`.
///
/// # Panics
///
/// Panics if HMAC initialization fails, which cannot happen since HMAC
/// accepts keys of any length.
fn sign(secret: &str, data: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key size");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Issues a token for `session_id` stamped with the current time.
///
/// # Errors
///
/// Returns `GateError::InvalidArgument` if `session_id` or `secret` is empty.
pub fn generate_session_token(session_id: &str, secret: &str) -> Result<String> {
    generate_session_token_at(session_id, secret, now_ms())
}

/// Issues a token for `session_id` stamped with `issued_at_ms`.
///
/// # Errors
///
/// Returns `GateError::InvalidArgument` if `session_id` or `secret` is empty.
pub fn generate_session_token_at(
    session_id: &str,
    secret: &str,
    issued_at_ms: u64,
) -> Result<String> {
    if session_id.is_empty() {
        return Err(GateError::invalid("sessionId must be a non-empty string"));
    }
    if secret.is_empty() {
        return Err(GateError::invalid("secret must be a non-empty string"));
    }

    let data = format!("{session_id}:{issued_at_ms}");
    let signature = sign(secret, data.as_bytes());
    Ok(format!("{}.{signature}", STANDARD.encode(data)))
}

/// Verifies a token's signature and extracts its claims.
///
/// Never panics on untrusted input.
///
/// # Errors
///
/// Returns the [`TokenRejection`] describing the first check that failed.
pub fn validate_session_token(
    token: &str,
    secret: &str,
) -> std::result::Result<SessionClaims, TokenRejection> {
    let result = parse_and_verify(token, secret);
    if let Err(reason) = &result {
        debug!(reason = %reason, "Session token rejected");
    }
    result
}

fn parse_and_verify(
    token: &str,
    secret: &str,
) -> std::result::Result<SessionClaims, TokenRejection> {
    if token.is_empty() {
        return Err(TokenRejection::MissingToken);
    }
    if secret.is_empty() {
        return Err(TokenRejection::MissingSecret);
    }

    let mut parts = token.split('.');
    let (Some(encoded), Some(signature), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenRejection::InvalidFormat);
    };

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| TokenRejection::InvalidEncoding)?;

    let expected = sign(secret, &decoded);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(TokenRejection::InvalidSignature);
    }

    let data = String::from_utf8(decoded).map_err(|_| TokenRejection::InvalidEncoding)?;
    let (session_id, timestamp) = data
        .rsplit_once(':')
        .ok_or(TokenRejection::InvalidFormat)?;
    if session_id.is_empty() {
        return Err(TokenRejection::InvalidFormat);
    }
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenRejection::InvalidTimestamp);
    }
    let issued_at_ms = timestamp
        .parse()
        .map_err(|_| TokenRejection::InvalidTimestamp)?;

    Ok(SessionClaims {
        session_id: session_id.to_string(),
        issued_at_ms,
    })
}

/// Validates `token` and compares its age against `max_age_ms` using the current time.
#[must_use]
pub fn check_token_age(token: &str, secret: &str, max_age_ms: u64) -> TokenAge {
    check_token_age_at(token, secret, max_age_ms, now_ms())
}

/// Validates `token` and compares its age against `max_age_ms` at `now_ms`.
///
/// A token stamped in the future has a negative age and is not expired.
#[must_use]
pub fn check_token_age_at(token: &str, secret: &str, max_age_ms: u64, now_ms: u64) -> TokenAge {
    let claims = match validate_session_token(token, secret) {
        Ok(claims) => claims,
        Err(reason) => return TokenAge::Rejected(reason),
    };

    let age = i128::from(now_ms) - i128::from(claims.issued_at_ms);
    let age_ms = i64::try_from(age).unwrap_or(if age > 0 { i64::MAX } else { i64::MIN });

    if age > i128::from(max_age_ms) {
        TokenAge::Expired { age_ms }
    } else {
        TokenAge::Fresh { age_ms }
    }
}

/// Generates a random 256-bit session id, URL-safe base64 without padding.
#[must_use]
pub fn generate_session_id() -> String {
    let random_bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}
