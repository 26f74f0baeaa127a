pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::InMemoryStore;
pub use repo_types::{format_amount, UserId};
pub use services::{Ledger, SystemClock};
