pub mod auth;
pub mod booking;
pub mod directory;
pub mod error;
pub mod records;
pub mod slot;
pub mod user;
