//! Cookie-based session correlation
//!
//! Every request is tied to a [`SessionId`] taken from the `session_id`
//! cookie. Clients without one get a freshly minted token, returned through
//! `Set-Cookie` by [`SessionContext::respond`].

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::app::AppState;
use crate::session::SessionId;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: SessionId,
    issued: bool,
    max_age: u64,
    secure: bool,
}

impl SessionContext {
    /// Converts `reply` into a response, attaching the cookie for new sessions.
    pub fn respond(self, reply: impl IntoResponse) -> Response {
        let mut response = reply.into_response();
        if self.issued {
            match HeaderValue::from_str(&self.cookie()) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(err) => warn!("Could not encode session cookie: {}", err),
            }
        }
        response
    }

    fn cookie(&self) -> String {
        let same_site = if self.secure {
            "SameSite=None; Secure"
        } else {
            "SameSite=Lax"
        };
        format!(
            "{}={}; Path=/; HttpOnly; Max-Age={}; {}",
            SESSION_COOKIE, self.id, self.max_age, same_site
        )
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let (id, issued) = match session_cookie(&parts.headers) {
            Some(token) => (SessionId::new(token), false),
            None => {
                let id = SessionId::generate();
                debug!("Issued new session {}", id);
                (id, true)
            }
        };

        Ok(SessionContext {
            id,
            issued,
            max_age: state.config.session_ttl.as_secs(),
            secure: state.config.secure_cookie,
        })
    }
}

/// Finds a non-empty `session_id` value across all `Cookie` headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}
