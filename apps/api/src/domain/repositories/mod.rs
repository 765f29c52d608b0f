// Repository interfaces (ports)
// Implemented by adapters in the infrastructure layer

pub mod knowledge_repository;
pub mod state_store;

pub use knowledge_repository::KnowledgeRepository;
pub use state_store::{StateStore, StoreError};
