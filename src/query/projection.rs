use super::filter::{SqlBuilder, push_columns};
use super::{Query, SOURCE, cancellable, row};
use crate::core::error::Result;
use crate::entities::{Entity, Navigation};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Alias of the projected table.
const TARGET: &str = "t";

/// A [`Query`] over `E` mapped onto the related `T` reached through a
/// navigation: one entry per source row, in source order. A source whose
/// foreign key is unset or dangling yields `None`. Filters, ordering and
/// limit of the source query still apply; its includes do not, since only
/// `T` is returned.
pub struct Projection<E: Entity, T: Entity> {
    source: Query<E>,
    navigation: &'static Navigation<E>,
    distinct: bool,
    _target: PhantomData<fn() -> T>,
}

impl<E: Entity, T: Entity> Clone for Projection<E, T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            navigation: self.navigation,
            distinct: self.distinct,
            _target: PhantomData,
        }
    }
}

impl<E: Entity, T: Entity> fmt::Debug for Projection<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("source", &E::NAME)
            .field("target", &T::NAME)
            .field("sql", &self.sql())
            .field("distinct", &self.distinct)
            .finish()
    }
}

impl<E: Entity, T: Entity> Projection<E, T> {
    pub(crate) fn new(source: Query<E>, navigation: &'static Navigation<E>) -> Self {
        Self {
            source,
            navigation,
            distinct: false,
            _target: PhantomData,
        }
    }

    /// Drops repeated targets (same key), keeping the first occurrence.
    /// Missing targets collapse into a single `None`.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn sql(&self) -> String {
        self.builder().sql().to_string()
    }

    pub async fn to_list(&self, cancel: &CancellationToken) -> Result<Vec<Option<T>>> {
        cancellable(cancel, self.fetch()).await
    }

    async fn fetch(&self) -> Result<Vec<Option<T>>> {
        let mut builder = self.builder();
        debug!(
            entity = E::NAME,
            target = T::NAME,
            sql = builder.sql(),
            "executing projection"
        );

        let rows = builder.build().fetch_all(self.source.pool()).await?;
        let mut targets = rows
            .iter()
            .map(row::hydrate_optional::<T>)
            .collect::<Result<Vec<_>>>()?;

        if self.distinct {
            let key = T::metadata().key();
            let mut seen = HashSet::new();
            targets.retain(|target| seen.insert(target.as_ref().map(|t| key.read(t).to_string())));
        }
        Ok(targets)
    }

    fn builder(&self) -> SqlBuilder {
        let source = E::metadata();
        let target = T::metadata();

        let mut builder = SqlBuilder::new("SELECT ");
        push_columns::<T>(&mut builder, TARGET);
        builder.push(format_args!(
            " FROM {} AS {SOURCE} LEFT JOIN {} AS {TARGET} ON {TARGET}.{} = {SOURCE}.{}",
            source.table(),
            target.table(),
            target.key().column(),
            self.navigation.foreign_key().column(),
        ));
        self.source.push_tail(&mut builder);
        builder
    }
}
