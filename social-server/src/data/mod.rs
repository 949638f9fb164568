pub mod post_store;
pub mod user_repository;
