//! Shared building blocks: errors, domain types, collaborator traits

pub mod errors;
pub mod traits;
pub mod types;
