pub mod blog;
pub mod hr;
pub mod library;
pub mod notification;
pub mod user;
