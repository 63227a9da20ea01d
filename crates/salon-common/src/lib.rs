pub mod loyalty;
pub mod models;
pub mod validation;
