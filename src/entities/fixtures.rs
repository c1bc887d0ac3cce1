use super::{Entity, EntityMetadata};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerEntity {
    pub id: String,
    pub name: String,
}

impl Entity for CustomerEntity {
    const NAME: &'static str = "CustomerEntity";

    fn metadata() -> &'static EntityMetadata<Self> {
        lazy_static! {
            static ref META: EntityMetadata<CustomerEntity> = EntityMetadata::builder("customers")
                .key("Id", "id", |c: &CustomerEntity| &c.id, |c| &mut c.id)
                .field("Name", "name", |c: &CustomerEntity| &c.name, |c| &mut c.name)
                .build();
        }
        &META
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderEntity {
    pub id: String,
    pub customer_id: Option<String>,
    pub amount: f64,
    pub quantity: i32,
    pub placed_at: Option<DateTime<Utc>>,
    pub customer: Option<CustomerEntity>,
}

impl Entity for OrderEntity {
    const NAME: &'static str = "OrderEntity";

    fn metadata() -> &'static EntityMetadata<Self> {
        lazy_static! {
            static ref META: EntityMetadata<OrderEntity> = EntityMetadata::builder("orders")
                .key("Id", "id", |o: &OrderEntity| &o.id, |o| &mut o.id)
                .field("CustomerId", "customer_id", |o: &OrderEntity| &o.customer_id, |o| &mut o.customer_id)
                .field("Amount", "amount", |o: &OrderEntity| &o.amount, |o| &mut o.amount)
                .field("Quantity", "quantity", |o: &OrderEntity| &o.quantity, |o| &mut o.quantity)
                .field("PlacedAt", "placed_at", |o: &OrderEntity| &o.placed_at, |o| &mut o.placed_at)
                .belongs_to("Customer", "CustomerId", |o: &mut OrderEntity, c: CustomerEntity| {
                    o.customer = Some(c)
                })
                .build();
        }
        &META
    }
}
