//! End-to-end runs against a real MySQL.
//!
//! Needs `MYSQL_URL` pointing at a scratch database, e.g.
//! `MYSQL_URL=root:pw@tcp(127.0.0.1:3306)/demo cargo test -- --ignored`.

use sqlx::any::install_default_drivers;
use sqlx::{AnyConnection, Connection, Row};
use tower::ServiceExt;

use datastore_exerciser::config::endpoint::connection_url;
use datastore_exerciser::config::{BackendConfig, BackendKind, ExerciserConfig};
use datastore_exerciser::HttpServer;

mod common;

fn server(address: &str, teardown: bool) -> HttpServer {
    let mut backend = BackendConfig::new(BackendKind::Mysql, address);
    backend.iterations = Some(3);
    backend.teardown = teardown;
    let config = ExerciserConfig {
        backends: vec![backend],
        ..ExerciserConfig::default()
    };
    HttpServer::new(config).unwrap()
}

async fn load_table_exists(conn: &mut AnyConnection) -> bool {
    let row = sqlx::query(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_name = 'load_demo'",
    )
    .fetch_one(conn)
    .await
    .unwrap();
    row.get::<i64, _>(0) > 0
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn mysql_run_inserts_exactly_the_configured_rows_then_drops() {
    let address = std::env::var("MYSQL_URL").expect("MYSQL_URL");
    let url = connection_url(BackendKind::Mysql, &address).unwrap();

    install_default_drivers();
    let mut conn = AnyConnection::connect(&url).await.unwrap();
    sqlx::query("DROP TABLE IF EXISTS load_demo")
        .execute(&mut conn)
        .await
        .unwrap();

    let kept = server(&address, false);
    let response = kept.router().oneshot(common::get("/mysql")).await.unwrap();
    assert_eq!(response.status(), 302);

    let row = sqlx::query("SELECT COUNT(*) FROM load_demo")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(row.get::<i64, _>(0), 3);

    let dropped = server(&address, true);
    let response = dropped.router().oneshot(common::get("/mysql")).await.unwrap();
    assert_eq!(response.status(), 302);
    assert!(!load_table_exists(&mut conn).await);

    conn.close().await.unwrap();
}
