//! Common repository traits
//!
//! This module defines the generic interfaces for database operations over
//! any registered [`Entity`].

use crate::core::error::Result;
use crate::entities::{Entity, Value};
use tokio_util::sync::CancellationToken;

/// Trait for creating new entities in the database
///
/// # Type Parameters
/// * `E` - Entity type; a missing identity is generated before insertion
pub trait Create<E: Entity> {
    /// Inserts an entity and saves the change
    ///
    /// # Arguments
    /// * `entity` - Entity to insert; an empty `Id` is replaced by a new UUID
    ///
    /// # Returns
    /// * `Ok(E)` - Inserted entity, carrying its identity
    /// * `Err(Error)` - Error during insertion
    async fn add(&self, entity: E) -> Result<E>;

    /// Inserts every entity of `range` in one save
    async fn add_range(&self, range: Vec<E>) -> Result<Vec<E>>;
}

/// Trait for reading entities of type `E`
pub trait Read<E: Entity> {
    /// Reads every entity of the table
    ///
    /// # Returns
    /// * `Ok(Vec<E>)` - All entities (can be empty)
    /// * `Err(Error::Cancelled)` - `cancel` fired before the read completed
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<E>>;

    /// Reads an entity by its identity
    ///
    /// # Returns
    /// * `Ok(Some(E))` - Entity found
    /// * `Ok(None)` - No entity with that identity
    async fn get_by_id(
        &self,
        id: impl Into<Value> + Send,
        cancel: &CancellationToken,
    ) -> Result<Option<E>>;
}

/// Trait for reading the entities related to `E` through a navigation
pub trait ReadRelated<E: Entity> {
    /// Reads the `T` referenced by every `E` whose `property` equals `value`
    ///
    /// # Arguments
    /// * `property` - Property of `E` to filter on
    /// * `value` - Value the property must equal
    ///
    /// # Returns
    /// * `Ok(Vec<Option<T>>)` - One entry per matching `E`, in source order;
    ///   `None` where the navigation is unset
    /// * `Err(Error::UnknownProperty | Error::UnknownNavigation)` - Bad name
    async fn get_related_by_id<T: Entity>(
        &self,
        property: &str,
        value: impl Into<Value> + Send,
        cancel: &CancellationToken,
    ) -> Result<Vec<Option<T>>>;

    /// Reads the distinct `T` referenced by every `E` whose property value is
    /// in `values`
    ///
    /// # Arguments
    /// * `collection` - Name of the value collection: the property name plus
    ///   one trailing character (`"CustomerIds"` filters on `CustomerId`)
    /// * `values` - Accepted property values; empty means no filter
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - Distinct reachable related entities, first occurrence
    ///   order; sources with an unset navigation contribute nothing
    async fn get_by_range<T: Entity, V: Into<Value> + Clone + Sync>(
        &self,
        collection: &str,
        values: &[V],
        cancel: &CancellationToken,
    ) -> Result<Vec<T>>;
}

/// Trait for updating existing entities
pub trait Update<E: Entity> {
    /// Overwrites the stored row with `entity`
    ///
    /// # Returns
    /// * `Ok(E)` - Updated entity
    /// * `Err(Error::NotFound)` - No row with the entity's identity
    async fn update(&self, entity: E) -> Result<E>;

    /// Overwrites every entity of `range` in one save
    async fn update_range(&self, range: Vec<E>) -> Result<Vec<E>>;
}

/// Trait for deleting entities
pub trait Delete<E: Entity> {
    /// Deletes the row of `entity`
    ///
    /// # Returns
    /// * `Ok(E)` - Deleted entity
    /// * `Err(Error::NotFound)` - No row with the entity's identity
    async fn delete(&self, entity: E) -> Result<E>;

    /// Deletes every entity of `range` in one save
    async fn delete_range(&self, range: Vec<E>) -> Result<Vec<E>>;
}
