use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub user_id: Uuid,
}

/// Toggle the caller's like on a post.
///
/// Responds with the full `ToggleOutcome`: the ledger state after the call,
/// the counter value, whether the call converged on a concurrent toggle and
/// any counter warning. Clients merge it instead of trusting their
/// optimistic prediction.
pub async fn toggle_like(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    req: web::Json<ToggleLikeRequest>,
) -> ServiceResult<HttpResponse> {
    let outcome = state.engagement.toggle_like(*post_id, req.user_id).await?;

    Ok(HttpResponse::Ok().json(outcome))
}
