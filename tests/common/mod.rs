#![allow(dead_code)]

use entity_repository::{Config, DbContext, Entity, EntityMetadata, init_tracing};
use lazy_static::lazy_static;

const SCHEMA: &str = include_str!("../fixtures/schema.sql");
const SEED: &str = include_str!("../fixtures/seed.sql");

/// Crea un DbContext su un database SQLite in memoria con schema e dati di test
///
/// # Returns
/// DbContext pronto con customers, orders, line_items e shipments caricati
pub async fn create_test_context() -> DbContext {
    let ctx = create_empty_context().await;
    run_script(&ctx, SEED).await;
    ctx
}

/// Come `create_test_context`, ma con le sole tabelle (nessuna riga)
pub async fn create_empty_context() -> DbContext {
    init_tracing("debug");
    let ctx = DbContext::connect(&Config::in_memory())
        .await
        .expect("Failed to open in-memory database");
    run_script(&ctx, SCHEMA).await;
    ctx
}

async fn run_script(ctx: &DbContext, script: &str) {
    for statement in script.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement)
            .execute(ctx.pool())
            .await
            .unwrap_or_else(|e| panic!("fixture statement failed: {statement}: {e}"));
    }
}

/// Conta le righe di una tabella
pub async fn count_rows(ctx: &DbContext, table: &str) -> i64 {
    use sqlx::Row;

    let row = sqlx::query(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(ctx.pool())
        .await
        .expect("Failed to count rows");
    row.get::<i64, _>(0)
}

// ============================================================
// Entità di test
// ============================================================

// Customer e Order sono gli stessi usati dagli unit test della libreria
#[path = "../../src/entities/fixtures.rs"]
mod fixtures;

pub use fixtures::{CustomerEntity, OrderEntity};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceEntity {
    pub id: String,
    pub amount: f64,
    pub note: Option<String>,
}

impl Entity for InvoiceEntity {
    const NAME: &'static str = "InvoiceEntity";

    fn metadata() -> &'static EntityMetadata<Self> {
        lazy_static! {
            static ref META: EntityMetadata<InvoiceEntity> = EntityMetadata::builder("invoices")
                .key("Id", "id", |i: &InvoiceEntity| &i.id, |i| &mut i.id)
                .field("Amount", "amount", |i: &InvoiceEntity| &i.amount, |i| &mut i.amount)
                .field("Note", "note", |i: &InvoiceEntity| &i.note, |i| &mut i.note)
                .build();
        }
        &META
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItemEntity {
    pub id: String,
    pub sku: String,
    pub quantity: i64,
}

impl Entity for LineItemEntity {
    const NAME: &'static str = "LineItemEntity";

    fn metadata() -> &'static EntityMetadata<Self> {
        lazy_static! {
            static ref META: EntityMetadata<LineItemEntity> = EntityMetadata::builder("line_items")
                .key("Id", "id", |l: &LineItemEntity| &l.id, |l| &mut l.id)
                .field("Sku", "sku", |l: &LineItemEntity| &l.sku, |l| &mut l.sku)
                .field("Quantity", "quantity", |l: &LineItemEntity| &l.quantity, |l| &mut l.quantity)
                .build();
        }
        &META
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentEntity {
    pub id: String,
    pub carrier: String,
    pub line_item_id: String,
    pub line_item: Option<LineItemEntity>,
}

impl Entity for ShipmentEntity {
    const NAME: &'static str = "ShipmentEntity";

    fn metadata() -> &'static EntityMetadata<Self> {
        lazy_static! {
            static ref META: EntityMetadata<ShipmentEntity> = EntityMetadata::builder("shipments")
                .key("Id", "id", |s: &ShipmentEntity| &s.id, |s| &mut s.id)
                .field("Carrier", "carrier", |s: &ShipmentEntity| &s.carrier, |s| &mut s.carrier)
                .field("LineItemId", "line_item_id", |s: &ShipmentEntity| &s.line_item_id, |s| &mut s.line_item_id)
                .belongs_to("LineItem", "LineItemId", |s: &mut ShipmentEntity, l: LineItemEntity| {
                    s.line_item = Some(l)
                })
                .build();
        }
        &META
    }
}

pub fn ids<E: Entity>(entities: &[E]) -> Vec<String> {
    let key = E::metadata().key();
    entities.iter().map(|e| key.read(e).to_string()).collect()
}

pub fn optional_ids<E: Entity>(entities: &[Option<E>]) -> Vec<Option<String>> {
    let key = E::metadata().key();
    entities
        .iter()
        .map(|e| e.as_ref().map(|e| key.read(e).to_string()))
        .collect()
}

/// Una proprietà per ciascun tipo di valore supportato
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingEntity {
    pub id: String,
    pub active: bool,
    pub samples: i64,
    pub ratio: f64,
    pub label: String,
    pub taken_at: chrono::DateTime<chrono::Utc>,
}

impl Entity for ReadingEntity {
    const NAME: &'static str = "ReadingEntity";

    fn metadata() -> &'static EntityMetadata<Self> {
        lazy_static! {
            static ref META: EntityMetadata<ReadingEntity> = EntityMetadata::builder("readings")
                .key("Id", "id", |r: &ReadingEntity| &r.id, |r| &mut r.id)
                .field("Active", "active", |r: &ReadingEntity| &r.active, |r| &mut r.active)
                .field("Samples", "samples", |r: &ReadingEntity| &r.samples, |r| &mut r.samples)
                .field("Ratio", "ratio", |r: &ReadingEntity| &r.ratio, |r| &mut r.ratio)
                .field("Label", "label", |r: &ReadingEntity| &r.label, |r| &mut r.label)
                .field("TakenAt", "taken_at", |r: &ReadingEntity| &r.taken_at, |r| &mut r.taken_at)
                .build();
        }
        &META
    }
}
