pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod identity;
pub mod state;
pub mod web;

#[cfg(test)]
mod testing;
