pub mod models;

pub use models::{AuthorProfile, Like, NewPost, Post, PostView, DEFAULT_CATEGORY};
