//! Metadata - Tabella dei campi e delle navigazioni di ogni entità
//!
//! Every entity type registers its properties once, mapping the property
//! name used by callers to the column it is stored in and to a getter/setter
//! pair over the concrete struct. Queries and the property accessor resolve
//! names against this table; nothing is introspected at runtime.

use super::{Entity, FieldValue, Value, ValueError, ValueKind};
use crate::core::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::any::{Any, TypeId};
use std::fmt;

/// Trailing marker removed from a target type name to get the navigation
/// property that leads to it (`CustomerEntity` -> `Customer`).
pub const NAVIGATION_SUFFIX: &str = "Entity";

lazy_static! {
    static ref SQL_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern");
}

type Getter<E> = Box<dyn Fn(&E) -> Value + Send + Sync>;
type Setter<E> = Box<dyn Fn(&mut E, Value) -> Result<(), ValueError> + Send + Sync>;
type Attach<E> = Box<dyn Fn(&mut E, Box<dyn Any + Send>) -> bool + Send + Sync>;

/// Name of the navigation property that leads to the entity type `type_name`.
pub fn navigation_name(type_name: &str) -> &str {
    match type_name.strip_suffix(NAVIGATION_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => type_name,
    }
}

pub struct PropertyDescriptor<E> {
    name: &'static str,
    column: &'static str,
    kind: ValueKind,
    nullable: bool,
    get: Getter<E>,
    set: Setter<E>,
}

impl<E: Entity> PropertyDescriptor<E> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn read(&self, entity: &E) -> Value {
        (self.get)(entity)
    }

    pub fn write(&self, entity: &mut E, value: Value) -> Result<()> {
        (self.set)(entity, value).map_err(|err| Error::TypeMismatch {
            entity: E::NAME,
            property: self.name,
            expected: err.expected,
            found: err.found.kind_name(),
        })
    }
}

impl<E> fmt::Debug for PropertyDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// A belongs-to reference from `E` to another entity type: `foreign_key` is
/// a property of `E` holding the target's key.
pub struct Navigation<E> {
    name: &'static str,
    target: &'static str,
    target_type: TypeId,
    foreign_key: usize,
    attach: Attach<E>,
}

impl<E: Entity> Navigation<E> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn foreign_key(&self) -> &PropertyDescriptor<E> {
        &E::metadata().properties[self.foreign_key]
    }

    /// Stores `related` on `entity`. Returns false if `T` is not the target type.
    pub fn attach<T: Entity>(&self, entity: &mut E, related: T) -> bool {
        (self.attach)(entity, Box::new(related))
    }
}

impl<E> fmt::Debug for Navigation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigation")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

pub struct EntityMetadata<E> {
    name: &'static str,
    table: &'static str,
    key: usize,
    properties: Vec<PropertyDescriptor<E>>,
    navigations: Vec<Navigation<E>>,
}

impl<E: Entity> EntityMetadata<E> {
    pub fn builder(table: &'static str) -> MetadataBuilder<E> {
        MetadataBuilder {
            table,
            key: None,
            properties: Vec::new(),
            navigations: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// The identity property.
    pub fn key(&self) -> &PropertyDescriptor<E> {
        &self.properties[self.key]
    }

    /// Position of the key among [`properties`](Self::properties), which is
    /// also its column index in a selected row.
    pub fn key_index(&self) -> usize {
        self.key
    }

    pub fn properties(&self) -> &[PropertyDescriptor<E>] {
        &self.properties
    }

    pub fn navigations(&self) -> &[Navigation<E>] {
        &self.navigations
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor<E>> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Like [`property`](Self::property) but a miss is an error.
    pub fn require(&self, name: &str) -> Result<&PropertyDescriptor<E>> {
        self.property(name)
            .ok_or_else(|| Error::unknown_property(self.name, name))
    }

    /// Navigation leading to `T`, found by stripping [`NAVIGATION_SUFFIX`]
    /// from `T::NAME`.
    pub fn navigation_to<T: Entity>(&self) -> Result<&Navigation<E>> {
        let wanted = navigation_name(T::NAME);
        self.navigations
            .iter()
            .find(|n| n.name == wanted && n.target_type == TypeId::of::<T>())
            .ok_or_else(|| Error::UnknownNavigation {
                entity: self.name,
                navigation: wanted.to_string(),
                target: T::NAME,
            })
    }
}

impl<E> fmt::Debug for EntityMetadata<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("properties", &self.properties)
            .field("navigations", &self.navigations)
            .finish()
    }
}

struct PendingNavigation<E> {
    name: &'static str,
    target: &'static str,
    target_type: TypeId,
    foreign_key: &'static str,
    attach: Attach<E>,
}

/// Registration of one entity type. Build it once, inside the entity's
/// `metadata()` static.
///
/// # Panics
///
/// [`build`](Self::build) panics on registration mistakes: identifiers that
/// are not plain SQL identifiers, duplicate property or navigation names, a
/// missing key, or a navigation whose foreign key is not a registered
/// property.
pub struct MetadataBuilder<E> {
    table: &'static str,
    key: Option<usize>,
    properties: Vec<PropertyDescriptor<E>>,
    navigations: Vec<PendingNavigation<E>>,
}

impl<E: Entity> MetadataBuilder<E> {
    /// Registers the identity property.
    pub fn key<F: FieldValue>(
        mut self,
        name: &'static str,
        column: &'static str,
        get: fn(&E) -> &F,
        set: fn(&mut E) -> &mut F,
    ) -> Self {
        assert!(
            self.key.is_none(),
            "{}: key registered twice ({name})",
            E::NAME
        );
        self.key = Some(self.properties.len());
        self.field(name, column, get, set)
    }

    pub fn field<F: FieldValue>(
        mut self,
        name: &'static str,
        column: &'static str,
        get: fn(&E) -> &F,
        set: fn(&mut E) -> &mut F,
    ) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            column,
            kind: F::KIND,
            nullable: F::NULLABLE,
            get: Box::new(move |entity| get(entity).to_value()),
            set: Box::new(move |entity, value| {
                *set(entity) = F::from_value(value)?;
                Ok(())
            }),
        });
        self
    }

    /// Registers a navigation to `T`, loaded through the `foreign_key`
    /// property and stored with `attach`.
    pub fn belongs_to<T: Entity>(
        mut self,
        name: &'static str,
        foreign_key: &'static str,
        attach: fn(&mut E, T),
    ) -> Self {
        self.navigations.push(PendingNavigation {
            name,
            target: T::NAME,
            target_type: TypeId::of::<T>(),
            foreign_key,
            attach: Box::new(move |entity, related| match related.downcast::<T>() {
                Ok(related) => {
                    attach(entity, *related);
                    true
                }
                Err(_) => false,
            }),
        });
        self
    }

    pub fn build(self) -> EntityMetadata<E> {
        let entity = E::NAME;
        assert_identifier(entity, self.table);

        for (i, property) in self.properties.iter().enumerate() {
            assert_identifier(entity, property.column);
            assert!(
                !self.properties[..i].iter().any(|p| p.name == property.name),
                "{entity}: property `{}` registered twice",
                property.name
            );
        }

        let key = self
            .key
            .unwrap_or_else(|| panic!("{entity}: no key property registered"));

        let mut navigations: Vec<Navigation<E>> = Vec::with_capacity(self.navigations.len());
        for pending in self.navigations {
            assert!(
                !navigations.iter().any(|n| n.name == pending.name),
                "{entity}: navigation `{}` registered twice",
                pending.name
            );
            let foreign_key = self
                .properties
                .iter()
                .position(|p| p.name == pending.foreign_key)
                .unwrap_or_else(|| {
                    panic!(
                        "{entity}: navigation `{}` uses unknown foreign key `{}`",
                        pending.name, pending.foreign_key
                    )
                });
            navigations.push(Navigation {
                name: pending.name,
                target: pending.target,
                target_type: pending.target_type,
                foreign_key,
                attach: pending.attach,
            });
        }

        EntityMetadata {
            name: entity,
            table: self.table,
            key,
            properties: self.properties,
            navigations,
        }
    }
}

fn assert_identifier(entity: &str, ident: &str) {
    assert!(
        SQL_IDENTIFIER.is_match(ident),
        "{entity}: `{ident}` is not a valid SQL identifier"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::fixtures::{CustomerEntity, OrderEntity};

    #[test]
    fn suffix_is_stripped_only_at_the_end() {
        assert_eq!(navigation_name("CustomerEntity"), "Customer");
        assert_eq!(navigation_name("EntityLink"), "EntityLink");
        assert_eq!(navigation_name("Customer"), "Customer");
        assert_eq!(navigation_name("Entity"), "Entity");
    }

    #[test]
    fn properties_resolve_by_name() {
        let meta = OrderEntity::metadata();
        assert_eq!(meta.table(), "orders");
        assert_eq!(meta.key().name(), "Id");
        assert_eq!(meta.key_index(), 0);

        let customer_id = meta.property("CustomerId").unwrap();
        assert_eq!(customer_id.column(), "customer_id");
        assert_eq!(customer_id.kind(), ValueKind::Text);
        assert!(customer_id.is_nullable());

        assert!(meta.property("customer_id").is_none());
        assert!(matches!(
            meta.require("Missing"),
            Err(Error::UnknownProperty { entity: "OrderEntity", .. })
        ));
    }

    #[test]
    fn navigation_found_through_target_type_name() {
        let nav = OrderEntity::metadata()
            .navigation_to::<CustomerEntity>()
            .unwrap();
        assert_eq!(nav.name(), "Customer");
        assert_eq!(nav.target(), "CustomerEntity");
        assert_eq!(nav.foreign_key().name(), "CustomerId");

        let err = CustomerEntity::metadata()
            .navigation_to::<OrderEntity>()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownNavigation { ref navigation, .. } if navigation == "Order"));
    }

    #[test]
    fn attach_stores_the_related_entity() {
        let nav = OrderEntity::metadata()
            .navigation_to::<CustomerEntity>()
            .unwrap();
        let mut order = OrderEntity::default();
        let customer = CustomerEntity {
            id: "C1".into(),
            name: "Ada".into(),
        };
        assert!(nav.attach(&mut order, customer.clone()));
        assert_eq!(order.customer, Some(customer));
        assert!(!nav.attach(&mut order, OrderEntity::default()));
    }

    #[derive(Default, Clone)]
    struct Unkeyed {
        label: String,
    }

    impl Entity for Unkeyed {
        const NAME: &'static str = "Unkeyed";

        fn metadata() -> &'static EntityMetadata<Self> {
            unreachable!()
        }
    }

    #[test]
    #[should_panic(expected = "no key property registered")]
    fn key_is_mandatory() {
        EntityMetadata::<Unkeyed>::builder("unkeyed")
            .field("Label", "label", |u: &Unkeyed| &u.label, |u| &mut u.label)
            .build();
    }

    #[test]
    #[should_panic(expected = "not a valid SQL identifier")]
    fn columns_must_be_plain_identifiers() {
        EntityMetadata::<Unkeyed>::builder("unkeyed")
            .key("Label", "label; drop", |u: &Unkeyed| &u.label, |u| &mut u.label)
            .build();
    }
}
