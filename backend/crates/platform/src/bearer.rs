//! Bearer credential extraction
//!
//! Pulls the raw token out of an `Authorization: Bearer <token>` header.
//! Verifying the token is the auth gate's job.

use axum::http::{HeaderMap, header};

/// Error when extracting a bearer credential
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Missing Authorization header")]
    Missing,

    #[error("Authorization header is not a bearer credential")]
    Malformed,
}

/// Extract the bearer token from request headers
///
/// The scheme is matched case-insensitively (RFC 7235). Surrounding
/// whitespace around the token is ignored; an empty token is malformed.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?
        .to_str()
        .map_err(|_| BearerError::Malformed)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(BearerError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let headers = headers_with("Bearer abc.def");
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def"));

        let headers = headers_with("bearer   xyz ");
        assert_eq!(extract_bearer_token(&headers), Ok("xyz"));
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), Err(BearerError::Missing));
    }

    #[test]
    fn test_wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(&headers), Err(BearerError::Malformed));

        let headers = headers_with("Bearer");
        assert_eq!(extract_bearer_token(&headers), Err(BearerError::Malformed));
    }
}
