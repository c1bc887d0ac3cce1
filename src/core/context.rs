//! Persistence context - Pool di connessioni, sorgenti di query e salvataggio delle modifiche
//!
//! `DbContext` is the unit-of-work boundary: reads go through [`Query`]
//! sources it hands out, writes are staged into a [`ChangeSet`] and committed
//! by one [`DbContext::save_changes`] call inside a single transaction.

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::entities::{Entity, Value};
use crate::query::{Query, SqlBuilder, push_value};
use crate::repositories::GenericRepository;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use validator::Validate;

#[derive(Clone, Debug)]
pub struct DbContext {
    pool: AnyPool,
}

impl DbContext {
    /// Opens the connection pool described by `config`.
    ///
    /// The URL scheme picks the driver (`mysql://`, `sqlite:`).
    #[instrument(skip(config), fields(env = %config.app_env))]
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        sqlx::any::install_default_drivers();

        let mut options = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .max_lifetime(config.connection_lifetime());
        if config.connection_lifetime().is_none() {
            options = options.idle_timeout(None::<Duration>);
        }

        let pool = options.connect(&config.database_url).await?;
        info!(
            max_connections = config.max_connections,
            "database pool ready"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// A fresh query source over every `E`.
    pub fn set<E: Entity>(&self) -> Query<E> {
        Query::new(self.pool.clone())
    }

    /// Point lookup by identity.
    pub async fn find<E: Entity>(
        &self,
        id: impl Into<Value>,
        cancel: &CancellationToken,
    ) -> Result<Option<E>> {
        self.set::<E>()
            .where_equals(E::metadata().key().name(), id)?
            .first(cancel)
            .await
    }

    pub fn repository<E: Entity>(&self) -> GenericRepository<E> {
        GenericRepository::new(self.clone())
    }

    /// Commits every staged statement in one transaction and returns the
    /// number of affected rows. If an update or delete matches no row the
    /// whole change set is rolled back with `Error::NotFound`.
    #[instrument(skip(self, changes), fields(statements = changes.len()))]
    pub async fn save_changes(&self, changes: ChangeSet) -> Result<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for mut statement in changes.statements {
            debug!(
                entity = statement.entity,
                sql = statement.builder.sql(),
                "executing statement"
            );
            let result = statement.builder.build().execute(&mut *tx).await?;

            if statement.expects_row && result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(Error::NotFound {
                    entity: statement.entity,
                    key: statement.key,
                });
            }
            affected += result.rows_affected();
        }

        tx.commit().await?;
        info!(affected, "changes saved");
        Ok(affected)
    }
}

struct Statement {
    entity: &'static str,
    key: String,
    builder: SqlBuilder,
    expects_row: bool,
}

/// Write statements staged for one [`DbContext::save_changes`].
#[derive(Default)]
pub struct ChangeSet {
    statements: Vec<Statement>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Rendered SQL of every staged statement, in execution order.
    pub fn sql(&self) -> Vec<String> {
        self.statements
            .iter()
            .map(|s| s.builder.sql().to_string())
            .collect()
    }

    pub fn insert<E: Entity>(&mut self, entity: &E) {
        let meta = E::metadata();
        let mut builder = SqlBuilder::new(format!("INSERT INTO {} (", meta.table()));
        for (i, property) in meta.properties().iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(property.column());
        }
        builder.push(") VALUES (");
        for (i, property) in meta.properties().iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, &property.read(entity));
        }
        builder.push(")");
        self.stage::<E>(entity, builder, false);
    }

    /// Overwrites every non-key column of the row identified by `entity`'s key.
    pub fn update<E: Entity>(&mut self, entity: &E) {
        let meta = E::metadata();
        let key = meta.key();
        let mut builder = SqlBuilder::new(format!("UPDATE {} SET ", meta.table()));

        let mut columns = meta
            .properties()
            .iter()
            .filter(|p| p.name() != key.name())
            .peekable();
        if columns.peek().is_none() {
            builder.push(format_args!("{} = ", key.column()));
            push_value(&mut builder, &key.read(entity));
        }
        for (i, property) in columns.enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(format_args!("{} = ", property.column()));
            push_value(&mut builder, &property.read(entity));
        }

        builder.push(format_args!(" WHERE {} = ", key.column()));
        push_value(&mut builder, &key.read(entity));
        self.stage::<E>(entity, builder, true);
    }

    pub fn delete<E: Entity>(&mut self, entity: &E) {
        let meta = E::metadata();
        let key = meta.key();
        let mut builder = SqlBuilder::new(format!(
            "DELETE FROM {} WHERE {} = ",
            meta.table(),
            key.column()
        ));
        push_value(&mut builder, &key.read(entity));
        self.stage::<E>(entity, builder, true);
    }

    fn stage<E: Entity>(&mut self, entity: &E, builder: SqlBuilder, expects_row: bool) {
        self.statements.push(Statement {
            entity: E::NAME,
            key: E::metadata().key().read(entity).to_string(),
            builder,
            expects_row,
        });
    }
}
