//! Generic data-access layer: CRUD and name-driven relational queries over
//! any entity type registered with an [`EntityMetadata`] table.
//!
//! ```ignore
//! let ctx = DbContext::connect(&Config::from_env()?).await?;
//! let orders = ctx.repository::<OrderEntity>();
//! let customers: Vec<CustomerEntity> = orders
//!     .get_by_range("CustomerIds", &["C1", "C2"], &CancellationToken::new())
//!     .await?;
//! ```

pub mod core;
pub mod entities;
pub mod query;
pub mod repositories;

// Re-export dei tipi principali per facilitare l'import
pub use self::core::{ChangeSet, Config, DbContext, Error, Result, init_tracing};
pub use entities::{Entity, EntityMetadata, PropertyAccess, Value, ValueKind};
pub use query::{Projection, Query};
pub use repositories::{Create, Delete, GenericRepository, Read, ReadRelated, Update};
pub use tokio_util::sync::CancellationToken;
