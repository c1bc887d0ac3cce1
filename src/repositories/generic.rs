//! GenericRepository - Repository generico per qualsiasi entità registrata

use super::{Create, Delete, Read, ReadRelated, Update};
use crate::core::context::{ChangeSet, DbContext};
use crate::core::error::Result;
use crate::entities::{Entity, PropertyAccess, Value};
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub struct GenericRepository<E: Entity> {
    context: DbContext,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for GenericRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.context.clone())
    }
}

impl<E: Entity> GenericRepository<E> {
    pub fn new(context: DbContext) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    pub fn context(&self) -> &DbContext {
        &self.context
    }

    async fn save(&self, changes: ChangeSet) -> Result<u64> {
        self.context.save_changes(changes).await
    }
}

/// Gives `entity` a UUID identity unless it already carries a non-blank one.
fn assign_identity<E: Entity>(entity: &mut E) -> Result<()> {
    let key = E::metadata().key().name();
    let missing = entity
        .get_property_value(key)
        .is_none_or(|id| id.trim().is_empty());
    if missing {
        let id = Uuid::new_v4().to_string();
        debug!(entity_type = E::NAME, %id, "identity assigned");
        entity.set_property_value(key, id)?;
    }
    Ok(())
}

/// `"CustomerIds"` -> `"CustomerId"`: the collection name minus its last character.
fn property_from_collection(collection: &str) -> &str {
    let mut chars = collection.chars();
    chars.next_back();
    chars.as_str()
}

impl<E: Entity> Create<E> for GenericRepository<E> {
    #[instrument(skip(self, entity), fields(entity_type = E::NAME))]
    async fn add(&self, mut entity: E) -> Result<E> {
        assign_identity(&mut entity)?;

        let mut changes = ChangeSet::new();
        changes.insert(&entity);
        self.save(changes).await?;

        info!(
            id = %E::metadata().key().read(&entity),
            "Entity created"
        );
        Ok(entity)
    }

    #[instrument(skip(self, range), fields(entity_type = E::NAME, count = range.len()))]
    async fn add_range(&self, mut range: Vec<E>) -> Result<Vec<E>> {
        let mut changes = ChangeSet::new();
        for entity in range.iter_mut() {
            assign_identity(entity)?;
            changes.insert(&*entity);
        }
        self.save(changes).await?;

        info!("{} entities created", range.len());
        Ok(range)
    }
}

impl<E: Entity> Read<E> for GenericRepository<E> {
    #[instrument(skip(self, cancel), fields(entity_type = E::NAME))]
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<E>> {
        let entities = self.context.set::<E>().to_list(cancel).await?;
        debug!("Found {} entities", entities.len());
        Ok(entities)
    }

    #[instrument(skip(self, id, cancel), fields(entity_type = E::NAME))]
    async fn get_by_id(
        &self,
        id: impl Into<Value> + Send,
        cancel: &CancellationToken,
    ) -> Result<Option<E>> {
        let entity = self.context.find::<E>(id, cancel).await?;
        if entity.is_some() {
            debug!("Entity found");
        } else {
            debug!("Entity not found");
        }
        Ok(entity)
    }
}

impl<E: Entity> ReadRelated<E> for GenericRepository<E> {
    #[instrument(skip(self, value, cancel), fields(entity_type = E::NAME, target = T::NAME))]
    async fn get_related_by_id<T: Entity>(
        &self,
        property: &str,
        value: impl Into<Value> + Send,
        cancel: &CancellationToken,
    ) -> Result<Vec<Option<T>>> {
        let related = self
            .context
            .set::<E>()
            .where_equals(property, value)?
            .select_entity::<T>()?
            .to_list(cancel)
            .await?;
        debug!("Found {} related entities", related.len());
        Ok(related)
    }

    #[instrument(
        skip(self, values, cancel),
        fields(entity_type = E::NAME, target = T::NAME, values = values.len())
    )]
    async fn get_by_range<T: Entity, V: Into<Value> + Clone + Sync>(
        &self,
        collection: &str,
        values: &[V],
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let property = property_from_collection(collection);
        let related = self
            .context
            .set::<E>()
            .include_entity::<T>()?
            .where_contains(property, values)?
            .select_entity::<T>()?
            .distinct()
            .to_list(cancel)
            .await?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        debug!(property, "Found {} distinct related entities", related.len());
        Ok(related)
    }
}

impl<E: Entity> Update<E> for GenericRepository<E> {
    #[instrument(skip(self, entity), fields(entity_type = E::NAME))]
    async fn update(&self, entity: E) -> Result<E> {
        let mut changes = ChangeSet::new();
        changes.update(&entity);
        self.save(changes).await?;

        info!(id = %E::metadata().key().read(&entity), "Entity updated");
        Ok(entity)
    }

    #[instrument(skip(self, range), fields(entity_type = E::NAME, count = range.len()))]
    async fn update_range(&self, range: Vec<E>) -> Result<Vec<E>> {
        let mut changes = ChangeSet::new();
        for entity in &range {
            changes.update(entity);
        }
        self.save(changes).await?;

        info!("{} entities updated", range.len());
        Ok(range)
    }
}

impl<E: Entity> Delete<E> for GenericRepository<E> {
    #[instrument(skip(self, entity), fields(entity_type = E::NAME))]
    async fn delete(&self, entity: E) -> Result<E> {
        let mut changes = ChangeSet::new();
        changes.delete(&entity);
        self.save(changes).await?;

        info!(id = %E::metadata().key().read(&entity), "Entity deleted");
        Ok(entity)
    }

    #[instrument(skip(self, range), fields(entity_type = E::NAME, count = range.len()))]
    async fn delete_range(&self, range: Vec<E>) -> Result<Vec<E>> {
        let mut changes = ChangeSet::new();
        for entity in &range {
            changes.delete(entity);
        }
        self.save(changes).await?;

        info!("{} entities deleted", range.len());
        Ok(range)
    }
}
