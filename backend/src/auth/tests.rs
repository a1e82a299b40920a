use super::*;

const ACCESS_SECRET: &str = "test-access-secret";
const REFRESH_SECRET: &str = "test-refresh-secret";

#[test]
fn access_token_round_trips() {
    let user_id = Uuid::new_v4();
    let token = create_access_token(user_id, "viewer@example.com", ACCESS_SECRET).unwrap();

    let claims = validate_token(&token, ACCESS_SECRET, TOKEN_TYPE_ACCESS).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.email, "viewer@example.com");
    assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
}

#[test]
fn refresh_token_is_not_accepted_as_access_token() {
    let token = create_refresh_token(Uuid::new_v4(), "viewer@example.com", ACCESS_SECRET).unwrap();

    // Same secret on purpose; the type claim alone must reject it.
    assert!(validate_token(&token, ACCESS_SECRET, TOKEN_TYPE_ACCESS).is_err());
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let token = create_access_token(Uuid::new_v4(), "viewer@example.com", REFRESH_SECRET).unwrap();

    assert!(validate_token(&token, ACCESS_SECRET, TOKEN_TYPE_ACCESS).is_err());
}

#[test]
fn garbage_token_is_rejected() {
    assert!(validate_token("not-a-jwt", ACCESS_SECRET, TOKEN_TYPE_ACCESS).is_err());
}
