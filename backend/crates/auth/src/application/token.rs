//! Bearer Token Codec
//!
//! Token layout before base64url encoding:
//! `user_id (16) | role id (2, BE) | expires_at_ms (8, BE) | HMAC-SHA256 (32)`.
//! The MAC covers the first 26 bytes.

use chrono::Utc;
use kernel::id::UserId;
use uuid::Uuid;

use crate::domain::{Identity, UserRole};
use crate::error::{AuthError, AuthResult};

const CLAIMS_LEN: usize = 16 + 2 + 8;
const TOKEN_LEN: usize = CLAIMS_LEN + platform::crypto::MAC_LEN;

/// Mint a token. Issuance belongs to the identity service; this exists for
/// it and for tests.
pub fn sign_token(identity: &Identity, secret: &[u8; 32]) -> String {
    let claims = encode_claims(identity);
    let mac = platform::crypto::hmac_sha256(secret, &claims);

    let mut token = Vec::with_capacity(TOKEN_LEN);
    token.extend_from_slice(&claims);
    token.extend_from_slice(&mac);
    platform::crypto::to_base64_url(&token)
}

/// Verify signature and expiry, returning the caller identity.
pub fn verify_token(token: &str, secret: &[u8; 32]) -> AuthResult<Identity> {
    verify_token_at(token, secret, Utc::now().timestamp_millis())
}

pub(crate) fn verify_token_at(token: &str, secret: &[u8; 32], now_ms: i64) -> AuthResult<Identity> {
    let bytes = platform::crypto::from_base64_url(token).map_err(|_| AuthError::InvalidToken)?;
    if bytes.len() != TOKEN_LEN {
        return Err(AuthError::InvalidToken);
    }

    let (claims, mac) = bytes.split_at(CLAIMS_LEN);
    if !platform::crypto::verify_hmac_sha256(secret, claims, mac) {
        return Err(AuthError::InvalidToken);
    }

    let identity = decode_claims(claims)?;
    if identity.is_expired_at(now_ms) {
        return Err(AuthError::TokenExpired);
    }
    Ok(identity)
}

fn encode_claims(identity: &Identity) -> [u8; CLAIMS_LEN] {
    let mut claims = [0u8; CLAIMS_LEN];
    claims[0..16].copy_from_slice(identity.user_id.as_uuid().as_bytes());
    claims[16..18].copy_from_slice(&identity.role.id().to_be_bytes());
    claims[18..26].copy_from_slice(&identity.expires_at_ms.to_be_bytes());
    claims
}

fn decode_claims(claims: &[u8]) -> AuthResult<Identity> {
    let id_bytes: [u8; 16] = claims[0..16]
        .try_into()
        .map_err(|_| AuthError::InvalidToken)?;
    let role_bytes: [u8; 2] = claims[16..18]
        .try_into()
        .map_err(|_| AuthError::InvalidToken)?;
    let exp_bytes: [u8; 8] = claims[18..26]
        .try_into()
        .map_err(|_| AuthError::InvalidToken)?;

    // A validly signed token with an unknown role means issuer/gate drift.
    let role = UserRole::from_id(i16::from_be_bytes(role_bytes)).ok_or(AuthError::InvalidToken)?;

    Ok(Identity::new(
        UserId::from_uuid(Uuid::from_bytes(id_bytes)),
        role,
        i64::from_be_bytes(exp_bytes),
    ))
}
