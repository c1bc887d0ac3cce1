//! Rendering SQL dei filtri e dei valori legati

use crate::entities::{Entity, Value};
use sqlx::{Any, QueryBuilder};

pub(crate) type SqlBuilder = QueryBuilder<'static, Any>;

/// One filter stage; stages are joined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Filter {
    Equals { column: &'static str, value: Value },
    In { column: &'static str, values: Vec<Value> },
}

impl Filter {
    fn push(&self, builder: &mut SqlBuilder, alias: &str) {
        match self {
            Filter::Equals { column, value } if value.is_null() => {
                builder.push(format_args!("{alias}.{column} IS NULL"));
            }
            Filter::Equals { column, value } => {
                builder.push(format_args!("{alias}.{column} = "));
                push_value(builder, value);
            }
            Filter::In { column, values } => {
                builder.push(format_args!("{alias}.{column} IN ("));
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        builder.push(", ");
                    }
                    push_value(builder, value);
                }
                builder.push(")");
            }
        }
    }
}

pub(crate) fn push_where(builder: &mut SqlBuilder, filters: &[Filter], alias: &str) {
    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        filter.push(builder, alias);
    }
}

/// Binds `value`; nulls are written as a literal `NULL`.
pub(crate) fn push_value(builder: &mut SqlBuilder, value: &Value) {
    match value {
        Value::Null => {
            builder.push("NULL");
        }
        Value::Bool(b) => {
            builder.push_bind(*b);
        }
        Value::Int(i) => {
            builder.push_bind(*i);
        }
        Value::Float(x) => {
            builder.push_bind(*x);
        }
        Value::Text(s) => {
            builder.push_bind(s.clone());
        }
        Value::Timestamp(ts) => {
            builder.push_bind(ts.to_rfc3339());
        }
    }
}

/// `alias.col_a, alias.col_b, ...` in registration order.
pub(crate) fn push_columns<E: Entity>(builder: &mut SqlBuilder, alias: &str) {
    for (i, property) in E::metadata().properties().iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(format_args!("{alias}.{}", property.column()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures::OrderEntity;

    #[test]
    fn filters_render_with_placeholders() {
        let mut builder = SqlBuilder::new("SELECT 1 FROM orders AS s");
        push_where(
            &mut builder,
            &[
                Filter::Equals {
                    column: "customer_id",
                    value: Value::from("C1"),
                },
                Filter::In {
                    column: "quantity",
                    values: vec![Value::from(1), Value::from(2)],
                },
                Filter::Equals {
                    column: "placed_at",
                    value: Value::Null,
                },
            ],
            "s",
        );
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM orders AS s WHERE s.customer_id = ? AND s.quantity IN (?, ?) AND s.placed_at IS NULL"
        );
    }

    #[test]
    fn columns_follow_registration_order() {
        let mut builder = SqlBuilder::new("SELECT ");
        push_columns::<OrderEntity>(&mut builder, "t");
        assert_eq!(
            builder.sql(),
            "SELECT t.id, t.customer_id, t.amount, t.quantity, t.placed_at"
        );
    }
}
