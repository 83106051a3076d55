pub mod entity;
pub mod error;
pub mod feed;
pub mod session;
