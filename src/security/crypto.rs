//! Cryptographic utilities.
//!
//! Provides signed session tokens and session id generation.

pub mod token;
pub use token::{
    SessionClaims, TokenAge, TokenRejection, check_token_age, check_token_age_at,
    generate_session_id, generate_session_token, generate_session_token_at,
    validate_session_token,
};
