//! Provider configuration domain

mod entity;
mod repository;

pub use entity::{
    ProviderConfigUpdate, ProviderConfiguration, ProviderKind, DEFAULT_CONFIG_KEY,
};
pub use repository::ProviderConfigRepository;

#[cfg(test)]
pub use repository::MockProviderConfigRepository;
