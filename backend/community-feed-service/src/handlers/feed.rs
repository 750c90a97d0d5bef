use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::services::FeedPage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    /// Whose like state to merge in; anonymous when absent
    pub viewer_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Get the post feed of a community
pub async fn get_community_feed(
    state: web::Data<AppState>,
    community_id: web::Path<Uuid>,
    query: web::Query<FeedQueryParams>,
) -> ServiceResult<HttpResponse> {
    let page = FeedPage {
        limit: query.limit,
        offset: query.offset,
    };
    let posts = state
        .feed
        .get_feed(*community_id, query.viewer_id, page)
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}
