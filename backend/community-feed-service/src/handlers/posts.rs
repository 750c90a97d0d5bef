/// Post handlers - HTTP endpoints for post creation and lookup
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::services::CreatePostInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub author_id: Uuid,
    pub content: String,
    pub title: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub viewer_id: Option<Uuid>,
}

/// Create a new post in a community
pub async fn create_post(
    state: web::Data<AppState>,
    community_id: web::Path<Uuid>,
    req: web::Json<CreatePostRequest>,
) -> ServiceResult<HttpResponse> {
    let req = req.into_inner();
    let input = CreatePostInput {
        community_id: *community_id,
        author_id: req.author_id,
        content: req.content,
        title: req.title,
        category: req.category,
    };

    let post = state.posts.create_post(input).await?;

    Ok(HttpResponse::Created().json(post))
}

/// Get a post by ID, decorated for the viewer
pub async fn get_post(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    query: web::Query<ViewerQuery>,
) -> ServiceResult<HttpResponse> {
    let post = state.feed.get_post(*post_id, query.viewer_id).await?;
    Ok(HttpResponse::Ok().json(post))
}
