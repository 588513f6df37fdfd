use crate::MemoryDriver;
use litesql::{ClientConfig, DialectRegistry, Entity, LiteSqlClient, Result, Row, RowSet, Value};
use rust_decimal::Decimal;
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Entity, Debug, Clone, PartialEq)]
#[table_name("orders")]
pub struct Order {
    #[column(primary_key, auto_increment)]
    pub id: i64,
    pub status: i32,
    #[column(name = "customer_name")]
    pub customer: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub created: PrimitiveDateTime,
    #[column(ignore)]
    pub selected: bool,
}

#[derive(Entity, Debug, Clone, PartialEq)]
pub struct Customer {
    #[column(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub vip: bool,
}

/// Line of an order, the key is assigned by the application.
#[derive(Entity, Debug, Clone, PartialEq)]
#[table_name("order_items")]
#[auto_increment(false)]
pub struct OrderItem {
    #[column(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub product: String,
    pub quantity: i32,
}

/// Entity without key, only usable for inserts and queries.
#[derive(Entity, Debug, Clone, PartialEq)]
pub struct AuditLog {
    pub message: String,
    pub at: Option<PrimitiveDateTime>,
}

/// Client of `dialect` over a fresh [`MemoryDriver`], returned too for inspection.
pub fn memory_client(dialect: &str) -> Result<(LiteSqlClient<MemoryDriver>, MemoryDriver)> {
    memory_client_with(ClientConfig::new(dialect, format!("memory://{}", dialect)))
}

pub fn memory_client_with(config: ClientConfig) -> Result<(LiteSqlClient<MemoryDriver>, MemoryDriver)> {
    let driver = MemoryDriver::new();
    let client = LiteSqlClient::new(config, &DialectRegistry::new(), driver.clone())?;
    Ok((client, driver))
}

/// Rows shaped like the columns of `E`, as a driver would return them.
pub fn entity_rows<E: Entity>(entities: &[E]) -> RowSet {
    RowSet::new(
        E::columns().iter().map(|c| c.name()),
        entities.iter().map(Entity::row).collect(),
    )
}

/// Single row, single column result.
pub fn scalar_row(value: impl Into<Value>) -> RowSet {
    let row: Row = vec![value.into()].into_boxed_slice();
    RowSet::new(["value"], vec![row])
}
