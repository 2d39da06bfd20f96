//! Saved-product toggle (JSON).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use super::products::parse_id;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub saved: bool,
}

/// Toggle a product in the signed-in user's saved set.
///
/// The saved set changes before the backend call; if the call fails it is
/// rolled back and the error is returned.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>> {
    let id = parse_id(&id)?;
    let saved = state.saved().toggle(&user, id).await?;
    Ok(Json(ToggleResponse { saved }))
}
