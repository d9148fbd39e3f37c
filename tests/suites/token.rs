use crate::common::{SECRET, START_MS};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use queuegate::{
    TokenAge, TokenRejection, check_token_age_at, generate_session_token,
    generate_session_token_at, validate_session_token,
};

#[test]
fn test_issue_then_validate() {
    let token = generate_session_token("abc-123", SECRET).unwrap();
    let claims = validate_session_token(&token, SECRET).unwrap();
    assert_eq!(claims.session_id, "abc-123");
}

#[test]
fn test_roundtrip_various_ids() {
    let long = "x".repeat(512);
    for session_id in ["a", "abc-123", "ünïcødé", "with space", long.as_str()] {
        let token = generate_session_token_at(session_id, SECRET, START_MS).unwrap();
        let claims = validate_session_token(&token, SECRET).unwrap();
        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.issued_at_ms, START_MS);
    }
}

#[test]
fn test_any_single_byte_change_is_rejected() {
    let token = generate_session_token_at("abc-123", SECRET, START_MS).unwrap();
    let bytes = token.as_bytes();

    for i in 0..bytes.len() {
        let mut tampered = bytes.to_vec();
        tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(
            validate_session_token(&tampered, SECRET).is_err(),
            "byte {i} change accepted"
        );
    }
}

#[test]
fn test_forged_payload_is_rejected() {
    let token = generate_session_token_at("victim", SECRET, START_MS).unwrap();
    let (_, signature) = token.split_once('.').unwrap();
    let forged = format!("{}.{signature}", STANDARD.encode(format!("admin:{START_MS}")));

    assert_eq!(
        validate_session_token(&forged, SECRET),
        Err(TokenRejection::InvalidSignature)
    );
}

#[test]
fn test_wrong_key_rejected() {
    let token = generate_session_token("id", "secret-a").unwrap();
    let rejection = validate_session_token(&token, "secret-b").unwrap_err();
    assert_eq!(rejection.to_string(), "Invalid signature");
}

#[test]
fn test_expiry_is_monotonic() {
    let max_age = 30 * 60 * 1000;
    let token = generate_session_token_at("id", SECRET, START_MS).unwrap();

    assert_eq!(
        check_token_age_at(&token, SECRET, max_age, START_MS),
        TokenAge::Fresh { age_ms: 0 }
    );
    assert!(!check_token_age_at(&token, SECRET, max_age, START_MS + max_age - 1).is_expired());
    assert!(check_token_age_at(&token, SECRET, max_age, START_MS + max_age + 1).is_expired());
}

#[test]
fn test_rejected_token_fails_closed() {
    let token = generate_session_token_at("id", SECRET, START_MS).unwrap();
    let age = check_token_age_at(&token, "other", u64::MAX, START_MS);
    assert_eq!(age, TokenAge::Rejected(TokenRejection::InvalidSignature));
    assert!(age.is_expired());
}
