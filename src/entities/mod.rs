//! Entities module - Contratto delle entità persistite e accesso ai campi per nome
//!
//! An entity is any struct that registers an [`EntityMetadata`] table once.
//! The table is what lets queries and the property accessor work from a
//! property *name* instead of typed code per entity.

pub mod accessor;
pub mod metadata;
pub mod value;

#[cfg(test)]
pub(crate) mod fixtures;

pub use accessor::PropertyAccess;
pub use metadata::{
    EntityMetadata, MetadataBuilder, NAVIGATION_SUFFIX, Navigation, PropertyDescriptor,
    navigation_name,
};
pub use value::{FieldValue, Value, ValueError, ValueKind};

/// A record type stored in one table.
///
/// ```ignore
/// impl Entity for CustomerEntity {
///     const NAME: &'static str = "CustomerEntity";
///
///     fn metadata() -> &'static EntityMetadata<Self> {
///         lazy_static! {
///             static ref META: EntityMetadata<CustomerEntity> =
///                 EntityMetadata::builder("customers")
///                     .key("Id", "id", |c: &CustomerEntity| &c.id, |c| &mut c.id)
///                     .field("Name", "name", |c: &CustomerEntity| &c.name, |c| &mut c.name)
///                     .build();
///         }
///         &META
///     }
/// }
/// ```
pub trait Entity: Default + Clone + Send + Sync + 'static {
    /// Type name; navigations to this type are named after it minus
    /// [`NAVIGATION_SUFFIX`].
    const NAME: &'static str;

    fn metadata() -> &'static EntityMetadata<Self>;
}
