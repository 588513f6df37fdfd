use litesql::{ClientConfig, Error, LiteSqlError, Value, lite_sql_error};
use litesql_tests::*;

fn items(count: i64) -> Vec<OrderItem> {
    (1..=count)
        .map(|id| OrderItem {
            id,
            order_id: id % 7,
            product: format!("product {}", id),
            quantity: 1,
        })
        .collect()
}

fn tuples(statement: &Statement) -> usize {
    statement.sql.matches("), (").count() + 1
}

#[tokio::test]
async fn large_inserts_are_split_in_order() {
    init_logs();
    let (client, driver) = memory_client("sqlite").expect("Could not create the client");
    assert_eq!(client.config().batch_size, 500);
    let mut session = client.session();
    let result = session
        .insert_many(&items(1200))
        .await
        .expect("Insert failed");
    assert_eq!(result.rows_affected, 1200);
    let statements = driver.statements();
    assert_eq!(
        statements.iter().map(tuples).collect::<Vec<_>>(),
        [500, 500, 200]
    );
    assert_eq!(
        statements.iter().map(|s| s.params.len()).collect::<Vec<_>>(),
        [2000, 2000, 800]
    );
    let first_ids = statements
        .iter()
        .map(|s| s.params[0].value.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        first_ids,
        [
            Value::Int64(Some(1)),
            Value::Int64(Some(501)),
            Value::Int64(Some(1001))
        ]
    );
    // Every statement names its parameters from scratch
    assert!(statements[2].sql.ends_with("(:id199, :order_id199, :product199, :quantity199)"));
}

#[tokio::test]
async fn batch_size_is_configurable() {
    init_logs();
    let (client, driver) = memory_client_with(
        ClientConfig::new("oracle", "memory://orcl").with_batch_size(2),
    )
    .expect("Could not create the client");
    let mut session = client.session();
    session
        .insert_many(&items(5))
        .await
        .expect("Insert failed");
    let statements = driver.statements();
    assert_eq!(
        statements.iter().map(tuples).collect::<Vec<_>>(),
        [2, 2, 1]
    );
    assert_eq!(
        statements[2].sql,
        r#"INSERT INTO "order_items" ("id", "order_id", "product", "quantity") VALUES (:id, :order_id, :product, :quantity)"#
    );

    let error = memory_client_with(ClientConfig::default().with_batch_size(0))
        .err()
        .expect("A zero batch size should be rejected");
    assert!(error.to_string().contains("batch size"));
}

#[tokio::test]
async fn failed_batch_inside_a_transaction_leaves_nothing() {
    init_logs();
    let (client, driver) = memory_client("sqlite").expect("Could not create the client");
    driver.respond(|_, params| {
        params
            .first()
            .is_some_and(|p| p.value == Value::Int64(Some(501)))
            .then(|| Err(Error::msg("Disk full")))
    });
    let mut session = client.session();
    session.begin_transaction().await.expect("Begin failed");
    let result = silent_logs! {
        session.insert_many(&items(1200)).await
    };
    assert!(format!("{:#}", result.expect_err("Insert should fail")).contains("Disk full"));
    // The third batch is never sent
    assert_eq!(driver.statements().len(), 2);
    session.rollback_transaction().await.expect("Rollback failed");
    assert!(driver.committed().is_empty());
}

#[tokio::test]
async fn unknown_dialect() {
    init_logs();
    let error = memory_client("db2")
        .err()
        .expect("The dialect should be unknown");
    assert!(lite_sql_error(&error).is_some_and(LiteSqlError::is_provider_unregistered));
    assert_eq!(error.to_string(), "Dialect `db2` is not registered");
}
