//! Repositories module - Repository generico sopra il persistence context
//!
//! `GenericRepository<E>` implements the CRUD traits for any registered
//! entity type, plus the two relational reads built on the query layer.

pub mod generic;
pub mod traits;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadRelated, Update};

pub use generic::GenericRepository;
