//! Eager loading delle navigazioni (include)

use super::Query;
use crate::core::error::Result;
use crate::entities::{Entity, Navigation, Value};
use futures::future::BoxFuture;
use sqlx::AnyPool;
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::debug;

/// Loads one navigation for a batch of already materialized entities.
pub(crate) trait IncludeLoader<E>: Send + Sync {
    fn navigation(&self) -> &'static str;

    fn load<'a>(&'a self, pool: &'a AnyPool, sources: &'a mut [E]) -> BoxFuture<'a, Result<()>>;
}

pub(crate) struct EagerLoad<E: Entity, T: Entity> {
    navigation: &'static Navigation<E>,
    _target: PhantomData<fn() -> T>,
}

impl<E: Entity, T: Entity> EagerLoad<E, T> {
    pub(crate) fn new(navigation: &'static Navigation<E>) -> Self {
        Self {
            navigation,
            _target: PhantomData,
        }
    }
}

impl<E: Entity, T: Entity> IncludeLoader<E> for EagerLoad<E, T> {
    fn navigation(&self) -> &'static str {
        self.navigation.name()
    }

    fn load<'a>(&'a self, pool: &'a AnyPool, sources: &'a mut [E]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let foreign_key = self.navigation.foreign_key();

            let mut keys: Vec<Value> = Vec::new();
            for source in sources.iter() {
                let key = foreign_key.read(source);
                if !key.is_null() && !keys.contains(&key) {
                    keys.push(key);
                }
            }
            if keys.is_empty() {
                return Ok(());
            }

            let target_key = T::metadata().key();
            let related = Query::<T>::new(pool.clone())
                .where_contains(target_key.name(), &keys)?
                .fetch()
                .await?;
            let by_key: HashMap<String, T> = related
                .into_iter()
                .filter_map(|target| target_key.read(&target).to_text().map(|k| (k, target)))
                .collect();

            let mut attached = 0usize;
            for source in sources.iter_mut() {
                let Some(key) = foreign_key.read(source).to_text() else {
                    continue;
                };
                if let Some(target) = by_key.get(&key) {
                    if self.navigation.attach(source, target.clone()) {
                        attached += 1;
                    }
                }
            }

            debug!(
                entity = E::NAME,
                navigation = self.navigation.name(),
                keys = keys.len(),
                attached,
                "navigation loaded"
            );
            Ok(())
        })
    }
}
