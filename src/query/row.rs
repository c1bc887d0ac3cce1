//! Decodifica delle righe in entità tramite la tabella dei metadati

use crate::core::error::Result;
use crate::entities::{Entity, Value, ValueKind};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::any::AnyRow;

fn decode_value(row: &AnyRow, index: usize, kind: ValueKind) -> Result<Value, sqlx::Error> {
    let value = match kind {
        // SQLite keeps flags in INTEGER columns; MySQL may report a boolean
        ValueKind::Bool => match row.try_get::<Option<i64>, _>(index) {
            Ok(flag) => flag.map(|flag| Value::Bool(flag != 0)),
            Err(_) => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        },
        ValueKind::Int => row.try_get::<Option<i64>, _>(index)?.map(Value::Int),
        ValueKind::Float => row.try_get::<Option<f64>, _>(index)?.map(Value::Float),
        ValueKind::Text => row.try_get::<Option<String>, _>(index)?.map(Value::Text),
        // stored as RFC 3339 text
        ValueKind::Timestamp => match row.try_get::<Option<String>, _>(index)? {
            Some(raw) => {
                let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|err| {
                    sqlx::Error::ColumnDecode {
                        index: index.to_string(),
                        source: Box::new(err),
                    }
                })?;
                Some(Value::Timestamp(parsed.with_timezone(&Utc)))
            }
            None => None,
        },
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Builds an `E` from a row whose columns are `E`'s properties in
/// registration order.
pub(crate) fn hydrate<E: Entity>(row: &AnyRow) -> Result<E> {
    let mut entity = E::default();
    for (index, property) in E::metadata().properties().iter().enumerate() {
        let value = decode_value(row, index, property.kind())?;
        property.write(&mut entity, value)?;
    }
    Ok(entity)
}

/// Like [`hydrate`], but a row whose key column is null (an outer join that
/// found no match) yields `None`.
pub(crate) fn hydrate_optional<E: Entity>(row: &AnyRow) -> Result<Option<E>> {
    let meta = E::metadata();
    if decode_value(row, meta.key_index(), meta.key().kind())?.is_null() {
        return Ok(None);
    }
    hydrate(row).map(Some)
}
