//! Caller identity forwarded by the authentication gateway.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{Role, UserId};
use domain::Identity;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The identity attached to a request, if any.
///
/// Missing or malformed headers yield `None`; the domain rejects such
/// callers as unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let user_id = header(USER_ID_HEADER).and_then(|v| v.trim().parse::<uuid::Uuid>().ok());
        let role = header(USER_ROLE_HEADER).and_then(|v| v.trim().parse::<Role>().ok());

        match (user_id, role) {
            (Some(user_id), Some(role)) => Caller(Some(Identity::new(UserId::from_uuid(user_id), role))),
            _ => Caller(None),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
