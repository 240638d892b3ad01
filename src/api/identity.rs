//! Caller identity.
//!
//! Authentication happens upstream; the authenticating proxy forwards the
//! user's id in the `x-user-id` header. The role and batch are looked up
//! here so handlers only ever see a [`Caller`].

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::db::repository;
use crate::error::AppError;
use crate::models::Caller;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The resolved caller, or `None` for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<Caller>);

impl Identity {
    pub fn caller(&self) -> Option<&Caller> {
        self.0.as_ref()
    }
}

pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = match request.headers().get(USER_ID_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::Unauthorized)?
                .trim()
                .to_string(),
        ),
        None => None,
    };

    let identity = match user_id {
        Some(user_id) => {
            let user = repository::find_user_by_id(&state.db, &user_id)
                .await?
                .ok_or_else(|| {
                    debug!("unknown caller {}", user_id);
                    AppError::Unauthorized
                })?;
            Identity(Some(Caller::from(user)))
        }
        None => Identity(None),
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}
