//! Identità dell'utente: il valore del cookie `user_id`.
//!
//! Il cookie non è firmato. Chi conosce un id valido vede e modifica i compiti di
//! quell'utente. Accettiamo però solo id con una forma sicura, perché il valore
//! finisce nel nome del file del database.

use axum::extract::FromRequestParts;
use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use compiti_core::new_user_id;
use std::convert::Infallible;

pub const COOKIE_NAME: &str = "user_id";

/// Circa 10 anni: in pratica il cookie non scade mai.
pub const COOKIE_MAX_AGE_SECS: u64 = 10 * 365 * 24 * 60 * 60;

const MAX_USER_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    /// true se l'id è stato generato ora perché il cookie mancava o non era valido.
    pub minted: bool,
}

impl Identity {
    /// Legge `user_id` dagli header Cookie; se manca (o ha una forma non ammessa) ne genera uno nuovo.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match cookie_value(headers, COOKIE_NAME) {
            Some(id) if is_well_formed(id) => Identity { user_id: id.to_string(), minted: false },
            Some(_) => {
                tracing::warn!("ignoring malformed user_id cookie");
                Self::mint()
            }
            None => Self::mint(),
        }
    }

    fn mint() -> Self {
        let user_id = new_user_id();
        tracing::debug!(%user_id, "minted new user id");
        Identity { user_id, minted: true }
    }

    /// Valore dell'header Set-Cookie che rende persistente questa identità.
    pub fn set_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
            COOKIE_NAME, self.user_id, COOKIE_MAX_AGE_SECS
        ))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity::from_headers(&parts.headers))
    }
}

/// Solo `[A-Za-z0-9_-]`, da 1 a 64 caratteri: niente separatori di percorso né `..`.
pub fn is_well_formed(user_id: &str) -> bool {
    !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

// Cerca il cookie in tutti gli header Cookie (possono essere più di uno).
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}
