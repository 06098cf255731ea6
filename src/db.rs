pub mod store;
pub use store::ObrasStore;
pub mod obras_repo;
pub use obras_repo::PgObrasRepository;
pub mod memory_repo;
pub use memory_repo::MemoryObrasRepository;
