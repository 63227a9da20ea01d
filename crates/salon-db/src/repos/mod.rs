pub mod booking;
pub mod refresh_token;
pub mod user;
