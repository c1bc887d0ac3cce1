//! Errori - Tassonomia degli errori del data-access layer

use crate::entities::ValueKind;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A property name did not resolve against the entity metadata.
    #[error("entity `{entity}` has no property named `{property}`")]
    UnknownProperty {
        entity: &'static str,
        property: String,
    },

    /// No navigation on `entity` leads to `target` under the naming convention.
    #[error("entity `{entity}` has no navigation `{navigation}` to `{target}`")]
    UnknownNavigation {
        entity: &'static str,
        navigation: String,
        target: &'static str,
    },

    #[error("property `{entity}.{property}` expects {expected}, got {found}")]
    TypeMismatch {
        entity: &'static str,
        property: &'static str,
        expected: ValueKind,
        found: String,
    },

    /// An update or delete matched no row.
    #[error("no `{entity}` with key `{key}`")]
    NotFound { entity: &'static str, key: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// True for faults raised while building a query, before touching the store.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownProperty { .. } | Self::UnknownNavigation { .. }
        )
    }

    pub(crate) fn unknown_property(entity: &'static str, property: &str) -> Self {
        Self::UnknownProperty {
            entity,
            property: property.to_string(),
        }
    }
}
