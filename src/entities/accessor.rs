//! Property accessor - lettura/scrittura di un campo identificato dal nome
//!
//! Reads and writes are lenient: a name the entity does not register is an
//! optional field, never an error.

use super::{Entity, PropertyDescriptor, Value};
use crate::core::error::Result;

pub trait PropertyAccess: Entity {
    /// Value of `name` coerced to text; `None` if the property is unknown or null.
    fn get_property_value(&self, name: &str) -> Option<String> {
        self.get_property_object(name)
            .and_then(|value| value.to_text())
    }

    /// Value of `name`; `None` if the property is unknown or null.
    fn get_property_object(&self, name: &str) -> Option<Value> {
        let value = Self::metadata().property(name)?.read(self);
        (!value.is_null()).then_some(value)
    }

    /// Writes `value` into `name`. Unknown names are ignored.
    ///
    /// # Errors
    /// `Error::TypeMismatch` when the value does not fit the property.
    fn set_property_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match Self::metadata().property(name) {
            Some(property) => property.write(self, value.into()),
            None => Ok(()),
        }
    }

    fn resolve_property(&self, name: &str) -> Option<&'static PropertyDescriptor<Self>> {
        Self::metadata().property(name)
    }
}

impl<E: Entity> PropertyAccess for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::entities::ValueKind;
    use crate::entities::fixtures::OrderEntity;

    fn order() -> OrderEntity {
        OrderEntity {
            id: "O1".into(),
            customer_id: Some("C1".into()),
            amount: 12.5,
            quantity: 3,
            ..Default::default()
        }
    }

    #[test]
    fn reads_coerce_to_text() {
        let order = order();
        assert_eq!(order.get_property_value("Id").as_deref(), Some("O1"));
        assert_eq!(order.get_property_value("Amount").as_deref(), Some("12.5"));
        assert_eq!(order.get_property_value("Quantity").as_deref(), Some("3"));
        assert_eq!(
            order.get_property_object("Quantity"),
            Some(Value::Int(3))
        );
    }

    #[test]
    fn unknown_or_unset_properties_read_as_nothing() {
        let order = order();
        assert_eq!(order.get_property_value("Colour"), None);
        assert_eq!(order.get_property_object("Colour"), None);
        assert_eq!(order.get_property_value("PlacedAt"), None);
    }

    #[test]
    fn writes_to_unknown_properties_are_ignored() {
        let mut order = order();
        order.set_property_value("Colour", "red").unwrap();
        assert_eq!(order, self::order());
    }

    #[test]
    fn writes_update_the_field() {
        let mut order = order();
        order.set_property_value("Id", "O2").unwrap();
        order.set_property_value("CustomerId", Value::Null).unwrap();
        assert_eq!(order.id, "O2");
        assert_eq!(order.customer_id, None);
    }

    #[test]
    fn writes_of_the_wrong_kind_fail() {
        let mut order = order();
        let err = order.set_property_value("Quantity", "three").unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                entity: "OrderEntity",
                property: "Quantity",
                expected: ValueKind::Int,
                ..
            }
        ));
        assert_eq!(order.quantity, 3);
    }

    #[test]
    fn resolve_returns_the_descriptor() {
        let order = order();
        let descriptor = order.resolve_property("PlacedAt").unwrap();
        assert_eq!(descriptor.column(), "placed_at");
        assert_eq!(descriptor.kind(), ValueKind::Timestamp);
        assert!(order.resolve_property("placed_at").is_none());
    }
}
