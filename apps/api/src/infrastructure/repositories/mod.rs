// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

mod atomic_file;
pub mod file_knowledge_repository;
pub mod file_state_store;

pub use file_knowledge_repository::FileKnowledgeRepository;
pub use file_state_store::FileStateStore;
