pub mod pool;
pub mod repos;
pub mod store;

// Re-export commonly used items
pub use pool::{create_pool, create_pool_with_size, run_migrations};
pub use repos::booking::{BookingRepo, BookingRow, BookingWithOwnerRow, NewBooking};
pub use repos::refresh_token::{RefreshTokenRepo, RefreshTokenRow};
pub use repos::user::{UserRepo, UserRow};
pub use store::{BookingUpdate, PgStore, SalonStore};
