//! Provider configuration repositories

mod in_memory;
mod postgres;

pub use in_memory::InMemoryProviderConfigRepository;
pub use postgres::{PostgresProviderConfigRepository, CONFIG_TABLE};
