pub mod auth;
pub mod video;
