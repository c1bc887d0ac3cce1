//! Query module - Sorgente di query componibile e costruzione dei predicati per nome
//!
//! A [`Query`] is a lazy description of a read over one entity table. Each
//! stage (`where_equals`, `where_contains`, `order_by`, `include_entity`,
//! `select_entity`) resolves its property or navigation name against the
//! entity metadata when the stage is added, so an unknown name fails before
//! anything reaches the store. Nothing runs until `to_list`/`first`.

mod filter;
mod include;
mod projection;
mod row;

pub use projection::Projection;

use crate::core::error::{Error, Result};
use crate::entities::{Entity, PropertyDescriptor, Value};
pub(crate) use filter::{SqlBuilder, push_value};
use filter::{Filter, push_columns, push_where};
use include::{EagerLoad, IncludeLoader};
use sqlx::AnyPool;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Alias of the queried table.
const SOURCE: &str = "s";

pub struct Query<E: Entity> {
    pool: AnyPool,
    filters: Vec<Filter>,
    order_by: Option<&'static PropertyDescriptor<E>>,
    includes: Vec<Arc<dyn IncludeLoader<E>>>,
    limit: Option<u32>,
}

impl<E: Entity> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            filters: self.filters.clone(),
            order_by: self.order_by,
            includes: self.includes.clone(),
            limit: self.limit,
        }
    }
}

impl<E: Entity> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let includes: Vec<_> = self.includes.iter().map(|i| i.navigation()).collect();
        f.debug_struct("Query")
            .field("entity", &E::NAME)
            .field("sql", &self.sql())
            .field("includes", &includes)
            .finish()
    }
}

impl<E: Entity> Query<E> {
    pub(crate) fn new(pool: AnyPool) -> Self {
        Self {
            pool,
            filters: Vec::new(),
            order_by: None,
            includes: Vec::new(),
            limit: None,
        }
    }

    /// Keeps the rows whose `property` equals `value`.
    ///
    /// # Errors
    /// `Error::UnknownProperty` if `property` is not registered on `E`.
    pub fn where_equals(mut self, property: &str, value: impl Into<Value>) -> Result<Self> {
        let column = E::metadata().require(property)?.column();
        self.filters.push(Filter::Equals {
            column,
            value: value.into(),
        });
        Ok(self)
    }

    /// Keeps the rows whose `property` is one of `values`.
    ///
    /// An empty `values` or an empty `property` leaves the query unchanged.
    pub fn where_contains<V>(mut self, property: &str, values: &[V]) -> Result<Self>
    where
        V: Into<Value> + Clone,
    {
        if values.is_empty() || property.is_empty() {
            return Ok(self);
        }
        let column = E::metadata().require(property)?.column();
        self.filters.push(Filter::In {
            column,
            values: values.iter().cloned().map(Into::into).collect(),
        });
        Ok(self)
    }

    /// Sorts ascending by the text form of `property`, ties by key. Replaces
    /// any earlier ordering.
    pub fn order_by(mut self, property: &str) -> Result<Self> {
        self.order_by = Some(E::metadata().require(property)?);
        Ok(self)
    }

    /// Loads the navigation leading to `T` together with the entities.
    ///
    /// # Errors
    /// `Error::UnknownNavigation` if `E` has no navigation named after `T`.
    pub fn include_entity<T: Entity>(mut self) -> Result<Self> {
        let navigation = E::metadata().navigation_to::<T>()?;
        if !self.includes.iter().any(|i| i.navigation() == navigation.name()) {
            self.includes
                .push(Arc::new(EagerLoad::<E, T>::new(navigation)));
        }
        Ok(self)
    }

    /// Projects every matching entity onto the `T` its navigation refers to,
    /// `None` where the navigation is unset.
    ///
    /// # Errors
    /// `Error::UnknownNavigation` if `E` has no navigation named after `T`.
    pub fn select_entity<T: Entity>(self) -> Result<Projection<E, T>> {
        let navigation = E::metadata().navigation_to::<T>()?;
        Ok(Projection::new(self, navigation))
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rendered SQL, with `?` placeholders for bound values.
    pub fn sql(&self) -> String {
        self.builder().sql().to_string()
    }

    pub async fn to_list(&self, cancel: &CancellationToken) -> Result<Vec<E>> {
        cancellable(cancel, self.fetch()).await
    }

    pub async fn first(&self, cancel: &CancellationToken) -> Result<Option<E>> {
        let query = self.clone().limit(1);
        Ok(query.to_list(cancel).await?.into_iter().next())
    }

    pub(crate) fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub(crate) async fn fetch(&self) -> Result<Vec<E>> {
        let mut builder = self.builder();
        debug!(entity = E::NAME, sql = builder.sql(), "executing query");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut entities = rows
            .iter()
            .map(row::hydrate::<E>)
            .collect::<Result<Vec<_>>>()?;

        for include in &self.includes {
            include.load(&self.pool, &mut entities).await?;
        }
        Ok(entities)
    }

    fn builder(&self) -> SqlBuilder {
        let mut builder = SqlBuilder::new("SELECT ");
        push_columns::<E>(&mut builder, SOURCE);
        builder.push(format_args!(" FROM {} AS {SOURCE}", E::metadata().table()));
        self.push_tail(&mut builder);
        builder
    }

    /// WHERE, ORDER BY and LIMIT over the source alias.
    pub(crate) fn push_tail(&self, builder: &mut SqlBuilder) {
        push_where(builder, &self.filters, SOURCE);

        if let Some(property) = self.order_by {
            builder.push(format_args!(
                " ORDER BY CAST({SOURCE}.{} AS CHAR)",
                property.column()
            ));
            let key = E::metadata().key();
            if key.name() != property.name() {
                builder.push(format_args!(", {SOURCE}.{}", key.column()));
            }
        }

        if let Some(limit) = self.limit {
            builder.push(format_args!(" LIMIT {limit}"));
        }
    }
}

/// Runs `work` unless `cancel` fires first; the pending store call is dropped.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = work => result,
    }
}
