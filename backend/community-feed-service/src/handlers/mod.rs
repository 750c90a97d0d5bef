/// HTTP handlers for community feed endpoints
///
/// - Feed: community posts with author and per-viewer like state
/// - Posts: create and fetch single posts
/// - Likes: the like toggle
pub mod feed;
pub mod likes;
pub mod posts;

use actix_web::{web, HttpResponse};

pub use feed::get_community_feed;
pub use likes::toggle_like;
pub use posts::{create_post, get_post};

async fn metrics_endpoint() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(crate::metrics::render())
}

/// Register every route on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(|| async { "OK" }))
        .route("/ready", web::get().to(|| async { "READY" }))
        .route("/metrics", web::get().to(metrics_endpoint))
        .service(
            web::scope("/api/v1")
                .route(
                    "/communities/{community_id}/posts",
                    web::get().to(get_community_feed),
                )
                .route(
                    "/communities/{community_id}/posts",
                    web::post().to(create_post),
                )
                .route("/posts/{post_id}", web::get().to(get_post))
                .route("/posts/{post_id}/like", web::post().to(toggle_like)),
        );
}
