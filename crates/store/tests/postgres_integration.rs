//! PostgreSQL integration tests.
//!
//! These need a Docker daemon for the throwaway Postgres container and are
//! ignored by default. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use common::{Money, UserId, Variant};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    CallbackApplication, CommerceStore, DeliveryInfo, NewPaymentAttempt, OrderDraft, OrderStatus,
    PaymentMethod, PaymentState, PaymentUpdate, PostgresStore, ProductFilter, seed_demo_catalog,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/0001_commerce_schema.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE payments, order_lines, orders, cart_lines, carts, products, categories")
        .execute(&pool)
        .await
        .unwrap();

    let store = PostgresStore::new(pool);
    seed_demo_catalog(&store).await.unwrap();
    store
}

fn delivery() -> DeliveryInfo {
    DeliveryInfo {
        phone_number: "0712345678".into(),
        full_name: "Wanjiku Kamau".into(),
        county: "Nairobi".into(),
        town: "Westlands".into(),
        address: "Mpaka Rd 12".into(),
    }
}

async fn order_for(store: &PostgresStore, user: UserId) -> store::Order {
    let cart = store.get_or_create_cart(user).await.unwrap();
    let products = store.list_products(ProductFilter::All).await.unwrap();
    store
        .add_or_merge_line(cart.id, products[0].id, 2, Variant::none())
        .await
        .unwrap();
    store
        .convert_cart_to_order(OrderDraft {
            user_id: user,
            delivery: delivery(),
            payment_method: PaymentMethod::Mpesa,
            delivery_fee: Money::from_shillings(500),
        })
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn merge_add_and_scoped_mutations() {
    let store = get_test_store().await;
    let user = UserId::new();
    let cart = store.get_or_create_cart(user).await.unwrap();
    let products = store.list_products(ProductFilter::All).await.unwrap();

    let red = Variant::new(Some("Red".into()), None);
    store
        .add_or_merge_line(cart.id, products[0].id, 2, red.clone())
        .await
        .unwrap();
    let merged = store
        .add_or_merge_line(cart.id, products[0].id, 3, red)
        .await
        .unwrap();
    assert_eq!(merged.quantity, 5);
    assert_eq!(store.cart_lines(cart.id).await.unwrap().len(), 1);

    let stranger = UserId::new();
    assert!(!store.set_line_quantity(stranger, merged.id, 1).await.unwrap());
    assert!(store.set_line_quantity(user, merged.id, 1).await.unwrap());
    assert!(store.delete_line(user, merged.id).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn conversion_is_atomic_and_snapshots_prices() {
    let store = get_test_store().await;
    let user = UserId::new();
    let order = order_for(&store, user).await;

    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.total_amount, order.subtotal + Money::from_shillings(500));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_state, PaymentState::Pending);

    let cart = store.get_or_create_cart(user).await.unwrap();
    assert!(store.cart_lines(cart.id).await.unwrap().is_empty());

    // Price change after conversion must not reprice the order.
    let product_id = order.lines[0].product_id;
    let snapshot_price = order.lines[0].unit_price;
    store
        .set_product_price(product_id, Money::from_shillings(9_999))
        .await
        .unwrap();
    let reloaded = store.find_order(user, order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.lines[0].unit_price, snapshot_price);
    assert_eq!(reloaded.total_amount, order.total_amount);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn callback_application_is_idempotent() {
    let store = get_test_store().await;
    let user = UserId::new();
    let order = order_for(&store, user).await;

    store
        .insert_payment(NewPaymentAttempt {
            order_id: order.id,
            transaction_id: "TXNTEST000001".into(),
            checkout_request_id: "ws_CO_test_1".into(),
            merchant_request_id: "MR10001".into(),
            phone_number: "254712345678".into(),
            amount: order.total_amount,
        })
        .await
        .unwrap();

    let first = store
        .apply_payment_update(
            "ws_CO_test_1",
            PaymentUpdate::Success {
                receipt: Some("QHX12ABC".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(first, CallbackApplication::Applied);

    let second = store
        .apply_payment_update(
            "ws_CO_test_1",
            PaymentUpdate::Success {
                receipt: Some("OTHER".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(second, CallbackApplication::AlreadyApplied);

    let attempt = store.latest_payment(order.id).await.unwrap().unwrap();
    assert_eq!(attempt.receipt_number.as_deref(), Some("QHX12ABC"));

    let reloaded = store.find_order(user, order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.payment_state, PaymentState::Completed);
    assert_eq!(reloaded.status, OrderStatus::Processing);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn orders_list_newest_first_and_scoped() {
    let store = get_test_store().await;
    let user = UserId::new();
    let first = order_for(&store, user).await;
    let second = order_for(&store, user).await;

    let orders = store.list_orders(user).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second.id);
    assert_eq!(orders[1].id, first.id);

    let stranger = UserId::new();
    assert!(store.find_order(stranger, first.id).await.unwrap().is_none());
    assert!(store.list_orders(stranger).await.unwrap().is_empty());
}
