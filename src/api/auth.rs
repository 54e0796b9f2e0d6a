// Copyright 2023 Remi Bernotavicius

use super::AppState;
use crate::account;
use crate::database::models::UserId;
use crate::{Error, Result};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// The caller, resolved from an `Authorization: Token <key>` header. No header means an
/// anonymous caller. A header that doesn't resolve is rejected.
#[derive(Debug, Copy, Clone)]
pub struct Viewer(pub Option<UserId>);

impl Viewer {
    pub fn require(self) -> Result<UserId> {
        self.0.ok_or(Error::Unauthorized)
    }
}

fn token_key(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();
    (scheme.eq_ignore_ascii_case("token") && !key.is_empty()).then_some(key)
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };
        let key = header
            .to_str()
            .ok()
            .and_then(token_key)
            .ok_or(Error::Unauthorized)?
            .to_owned();

        let user = state
            .db
            .interact(move |conn| account::resolve_token(conn, &key))
            .await?;
        Ok(Self(Some(user)))
    }
}

#[test]
fn token_header() {
    assert_eq!(token_key("Token abc123"), Some("abc123"));
    assert_eq!(token_key("token  abc123 "), Some("abc123"));
    assert_eq!(token_key("Bearer abc123"), None);
    assert_eq!(token_key("Token "), None);
    assert_eq!(token_key("abc123"), None);
}
