pub mod auth;
pub mod post;
