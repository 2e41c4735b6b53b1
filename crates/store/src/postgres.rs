//! PostgreSQL store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CategoryId, LineId, Money, OrderId, PaymentId, ProductId, UserId, Variant};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::records::{
    Cart, CartLine, Category, DeliveryInfo, NewCategory, NewPaymentAttempt, NewProduct, Order,
    OrderDraft, OrderLine, PaymentAttempt, Product,
};
use crate::status::{AttemptStatus, OrderStatus, PaymentMethod, PaymentState};
use crate::store::{CallbackApplication, CommerceStore, PaymentUpdate, ProductFilter};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, old_price_cents, category_id, \
     image_url, additional_images, stock, color_options, size_options, is_featured, created_at";

/// PostgreSQL-backed [`CommerceStore`] implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

// Variant selections are stored as empty-string columns so they can join
// the cart-line uniqueness index; '' maps back to "no selection".
fn variant_columns(variant: &Variant) -> (String, String) {
    (
        variant.color.clone().unwrap_or_default(),
        variant.size.clone().unwrap_or_default(),
    )
}

fn column_opt(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn variant_from_columns(color: String, size: String) -> Variant {
    Variant::new(column_opt(color), column_opt(size))
}

fn parse_order_status(value: &str) -> Result<OrderStatus> {
    OrderStatus::parse(value)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown order status {value:?}")))
}

fn parse_payment_state(value: &str) -> Result<PaymentState> {
    PaymentState::parse(value)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown payment state {value:?}")))
}

fn parse_attempt_status(value: &str) -> Result<AttemptStatus> {
    AttemptStatus::parse(value)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown attempt status {value:?}")))
}

fn parse_payment_method(value: &str) -> Result<PaymentMethod> {
    PaymentMethod::parse(value)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown payment method {value:?}")))
}

fn row_to_category(row: &PgRow) -> Result<Category> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
    })
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        old_price: row
            .try_get::<Option<i64>, _>("old_price_cents")?
            .map(Money::from_cents),
        category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
        image_url: row.try_get("image_url")?,
        additional_images: row.try_get("additional_images")?,
        stock: row.try_get("stock")?,
        color_options: row.try_get("color_options")?,
        size_options: row.try_get("size_options")?,
        is_featured: row.try_get("is_featured")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart_line(row: &PgRow) -> Result<CartLine> {
    let quantity: i32 = row.try_get("quantity")?;
    Ok(CartLine {
        id: LineId::from_uuid(row.try_get::<Uuid, _>("id")?),
        cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        image_url: row.try_get("image_url")?,
        unit_price: Money::from_cents(row.try_get("price_cents")?),
        quantity: quantity.max(0) as u32,
        variant: variant_from_columns(
            row.try_get("selected_color")?,
            row.try_get("selected_size")?,
        ),
    })
}

fn row_to_order_line(row: &PgRow) -> Result<OrderLine> {
    let quantity: i32 = row.try_get("quantity")?;
    Ok(OrderLine {
        id: LineId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        quantity: quantity.max(0) as u32,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        variant: variant_from_columns(
            row.try_get("selected_color")?,
            row.try_get("selected_size")?,
        ),
    })
}

fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let payment_state: String = row.try_get("payment_state")?;
    let payment_method: String = row.try_get("payment_method")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        lines,
        subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        delivery_fee: Money::from_cents(row.try_get("delivery_fee_cents")?),
        total_amount: Money::from_cents(row.try_get("total_cents")?),
        delivery: DeliveryInfo {
            phone_number: row.try_get("phone_number")?,
            full_name: row.try_get("full_name")?,
            county: row.try_get("county")?,
            town: row.try_get("town")?,
            address: row.try_get("address")?,
        },
        payment_method: parse_payment_method(&payment_method)?,
        status: parse_order_status(&status)?,
        payment_state: parse_payment_state(&payment_state)?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_payment(row: &PgRow) -> Result<PaymentAttempt> {
    let status: String = row.try_get("status")?;
    Ok(PaymentAttempt {
        id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        transaction_id: row.try_get("transaction_id")?,
        checkout_request_id: row.try_get("checkout_request_id")?,
        merchant_request_id: row.try_get("merchant_request_id")?,
        phone_number: row.try_get("phone_number")?,
        amount: Money::from_cents(row.try_get("amount_cents")?),
        status: parse_attempt_status(&status)?,
        receipt_number: row.try_get("receipt_number")?,
        created_at: row.try_get("created_at")?,
    })
}

const CART_LINE_SELECT: &str = r#"
    SELECT l.id, l.cart_id, l.product_id, l.quantity, l.selected_color, l.selected_size,
           p.name AS product_name, p.image_url, p.price_cents
    FROM cart_lines l
    JOIN products p ON p.id = l.product_id
"#;

#[async_trait]
impl CommerceStore for PostgresStore {
    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let id = CategoryId::new();
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, image_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(&new.image_url)
        .execute(&self.pool)
        .await?;

        Ok(Category {
            id,
            name: new.name,
            slug: new.slug,
            description: new.description,
            image_url: new.image_url,
        })
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let id = ProductId::new();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, old_price_cents, category_id,
                                  image_url, additional_images, stock, color_options, size_options,
                                  is_featured, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.cents())
        .bind(new.old_price.map(|p| p.cents()))
        .bind(new.category_id.as_uuid())
        .bind(&new.image_url)
        .bind(&new.additional_images)
        .bind(new.stock)
        .bind(&new.color_options)
        .bind(&new.size_options)
        .bind(new.is_featured)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id,
            name: new.name,
            description: new.description,
            price: new.price,
            old_price: new.old_price,
            category_id: new.category_id,
            image_url: new.image_url,
            additional_images: new.additional_images,
            stock: new.stock,
            color_options: new.color_options,
            size_options: new.size_options,
            is_featured: new.is_featured,
            created_at,
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, slug, description, image_url FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_category).collect()
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, name, slug, description, image_url FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_category).transpose()
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let rows = match filter {
            ProductFilter::All => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            ProductFilter::Category(category) => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 \
                     ORDER BY created_at DESC, id"
                ))
                .bind(category.as_uuid())
                .fetch_all(&self.pool)
                .await?
            }
            ProductFilter::Featured => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_featured \
                     ORDER BY created_at DESC, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(row_to_product).collect()
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn set_product_price(&self, id: ProductId, price: Money) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET price_cents = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(price.cents())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_or_create_cart(&self, user: UserId) -> Result<Cart> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(CartId::new().as_uuid())
        .bind(user.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, user_id, created_at FROM carts WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(Cart {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            created_at: row.try_get("created_at")?,
        })
    }

    async fn cart_lines(&self, cart: CartId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(&format!(
            "{CART_LINE_SELECT} WHERE l.cart_id = $1 ORDER BY l.created_at, l.id"
        ))
        .bind(cart.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_cart_line).collect()
    }

    async fn add_or_merge_line(
        &self,
        cart: CartId,
        product: ProductId,
        quantity: u32,
        variant: Variant,
    ) -> Result<CartLine> {
        let (color, size) = variant_columns(&variant);
        let mut tx = self.pool.begin().await?;

        let line_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO cart_lines (id, cart_id, product_id, quantity,
                                    selected_color, selected_size, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (cart_id, product_id, selected_color, selected_size)
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity
            RETURNING id
            "#,
        )
        .bind(LineId::new().as_uuid())
        .bind(cart.as_uuid())
        .bind(product.as_uuid())
        .bind(quantity as i32)
        .bind(&color)
        .bind(&size)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query(&format!("{CART_LINE_SELECT} WHERE l.id = $1"))
            .bind(line_id)
            .fetch_one(&mut *tx)
            .await?;
        let line = row_to_cart_line(&row)?;

        tx.commit().await?;
        Ok(line)
    }

    async fn set_line_quantity(&self, user: UserId, line: LineId, quantity: i64) -> Result<bool> {
        let result = if quantity <= 0 {
            sqlx::query(
                r#"
                DELETE FROM cart_lines USING carts
                WHERE cart_lines.id = $1
                  AND cart_lines.cart_id = carts.id
                  AND carts.user_id = $2
                "#,
            )
            .bind(line.as_uuid())
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE cart_lines SET quantity = $3
                FROM carts
                WHERE cart_lines.id = $1
                  AND cart_lines.cart_id = carts.id
                  AND carts.user_id = $2
                "#,
            )
            .bind(line.as_uuid())
            .bind(user.as_uuid())
            .bind(quantity as i32)
            .execute(&self.pool)
            .await?
        };
        Ok(result.rows_affected() > 0)
    }

    async fn delete_line(&self, user: UserId, line: LineId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_lines USING carts
            WHERE cart_lines.id = $1
              AND cart_lines.cart_id = carts.id
              AND carts.user_id = $2
            "#,
        )
        .bind(line.as_uuid())
        .bind(user.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, user: UserId) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM cart_lines USING carts
            WHERE cart_lines.cart_id = carts.id
              AND carts.user_id = $1
            "#,
        )
        .bind(user.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn convert_cart_to_order(&self, draft: OrderDraft) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let cart_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1")
            .bind(draft.user_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(cart_id) = cart_id else {
            return Ok(None);
        };

        // Lock the lines so a concurrent mutation cannot change what we
        // snapshot; only these exact rows are deleted below.
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.product_id, l.quantity, l.selected_color, l.selected_size,
                   p.name AS product_name, p.price_cents
            FROM cart_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.cart_id = $1
            ORDER BY l.created_at, l.id
            FOR UPDATE OF l
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::with_capacity(rows.len());
        let mut line_ids = Vec::with_capacity(rows.len());
        let mut subtotal = Money::zero();
        for row in &rows {
            line_ids.push(row.try_get::<Uuid, _>("id")?);
            let quantity: i32 = row.try_get("quantity")?;
            let line = OrderLine {
                id: LineId::new(),
                product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                product_name: row.try_get("product_name")?,
                quantity: quantity.max(0) as u32,
                unit_price: Money::from_cents(row.try_get("price_cents")?),
                variant: variant_from_columns(
                    row.try_get("selected_color")?,
                    row.try_get("selected_size")?,
                ),
            };
            subtotal += line.line_total();
            lines.push(line);
        }
        let total = subtotal + draft.delivery_fee;

        let order_id = OrderId::new();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, subtotal_cents, delivery_fee_cents, total_cents,
                                phone_number, full_name, county, town, address,
                                payment_method, status, payment_state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(draft.user_id.as_uuid())
        .bind(subtotal.cents())
        .bind(draft.delivery_fee.cents())
        .bind(total.cents())
        .bind(&draft.delivery.phone_number)
        .bind(&draft.delivery.full_name)
        .bind(&draft.delivery.county)
        .bind(&draft.delivery.town)
        .bind(&draft.delivery.address)
        .bind(draft.payment_method.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(PaymentState::Pending.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in lines.iter().enumerate() {
            let (color, size) = variant_columns(&line.variant);
            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, product_id, product_name, quantity,
                                         unit_price_cents, selected_color, selected_size, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(order_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(&line.product_name)
            .bind(line.quantity as i32)
            .bind(line.unit_price.cents())
            .bind(&color)
            .bind(&size)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_lines WHERE id = ANY($1)")
            .bind(&line_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(%order_id, lines = lines.len(), "cart converted to order");

        Ok(Some(Order {
            id: order_id,
            user_id: draft.user_id,
            lines,
            subtotal,
            delivery_fee: draft.delivery_fee,
            total_amount: total,
            delivery: draft.delivery,
            payment_method: draft.payment_method,
            status: OrderStatus::Pending,
            payment_state: PaymentState::Pending,
            created_at,
        }))
    }

    async fn find_order(&self, user: UserId, order: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, subtotal_cents, delivery_fee_cents, total_cents,
                   phone_number, full_name, county, town, address,
                   payment_method, status, payment_state, created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(order.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let line_rows = sqlx::query(
            r#"
            SELECT id, product_id, product_name, quantity, unit_price_cents,
                   selected_color, selected_size
            FROM order_lines
            WHERE order_id = $1
            ORDER BY position
            "#,
        )
        .bind(order.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let lines = line_rows
            .iter()
            .map(row_to_order_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(row_to_order(&row, lines)?))
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, subtotal_cents, delivery_fee_cents, total_cents,
                   phone_number, full_name, county, town, address,
                   payment_method, status, payment_state, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = rows
            .iter()
            .map(|r| r.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let line_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents,
                   selected_color, selected_size
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in &line_rows {
            let order_id: Uuid = row.try_get("order_id")?;
            lines_by_order
                .entry(order_id)
                .or_default()
                .push(row_to_order_line(row)?);
        }

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                row_to_order(row, lines_by_order.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn insert_payment(&self, new: NewPaymentAttempt) -> Result<PaymentAttempt> {
        let id = PaymentId::new();
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, transaction_id, checkout_request_id,
                                  merchant_request_id, phone_number, amount_cents, status,
                                  created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.order_id.as_uuid())
        .bind(&new.transaction_id)
        .bind(&new.checkout_request_id)
        .bind(&new.merchant_request_id)
        .bind(&new.phone_number)
        .bind(new.amount.cents())
        .bind(AttemptStatus::Pending.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        // A retry after failure puts the order back in flight.
        sqlx::query(
            "UPDATE orders SET payment_state = $2 WHERE id = $1 AND payment_state = $3",
        )
        .bind(new.order_id.as_uuid())
        .bind(PaymentState::Pending.as_str())
        .bind(PaymentState::Failed.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PaymentAttempt {
            id,
            order_id: new.order_id,
            transaction_id: new.transaction_id,
            checkout_request_id: new.checkout_request_id,
            merchant_request_id: new.merchant_request_id,
            phone_number: new.phone_number,
            amount: new.amount,
            status: AttemptStatus::Pending,
            receipt_number: None,
            created_at,
        })
    }

    async fn latest_payment(&self, order: OrderId) -> Result<Option<PaymentAttempt>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, transaction_id, checkout_request_id, merchant_request_id,
                   phone_number, amount_cents, status, receipt_number, created_at
            FROM payments
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(order.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_payment).transpose()
    }

    async fn apply_payment_update(
        &self,
        checkout_request_id: &str,
        update: PaymentUpdate,
    ) -> Result<CallbackApplication> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, order_id, status
            FROM payments
            WHERE checkout_request_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(checkout_request_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(CallbackApplication::Unmatched);
        };

        let attempt_id: Uuid = row.try_get("id")?;
        let order_id: Uuid = row.try_get("order_id")?;
        let status: String = row.try_get("status")?;
        if parse_attempt_status(&status)? == AttemptStatus::Success {
            return Ok(CallbackApplication::AlreadyApplied);
        }

        match update {
            PaymentUpdate::Success { receipt } => {
                sqlx::query(
                    r#"
                    UPDATE payments
                    SET status = $2, receipt_number = COALESCE($3, receipt_number)
                    WHERE id = $1
                    "#,
                )
                .bind(attempt_id)
                .bind(AttemptStatus::Success.as_str())
                .bind(receipt)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE orders
                    SET payment_state = $2,
                        status = CASE WHEN status = $3 THEN $4 ELSE status END
                    WHERE id = $1
                    "#,
                )
                .bind(order_id)
                .bind(PaymentState::Completed.as_str())
                .bind(OrderStatus::Pending.as_str())
                .bind(OrderStatus::Processing.as_str())
                .execute(&mut *tx)
                .await?;
            }
            PaymentUpdate::Failure => {
                sqlx::query("UPDATE payments SET status = $2 WHERE id = $1")
                    .bind(attempt_id)
                    .bind(AttemptStatus::Failed.as_str())
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    r#"
                    UPDATE orders SET payment_state = $2
                    WHERE id = $1 AND payment_state <> $3
                    "#,
                )
                .bind(order_id)
                .bind(PaymentState::Failed.as_str())
                .bind(PaymentState::Completed.as_str())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        tracing::debug!(checkout_request_id, "payment update applied");
        Ok(CallbackApplication::Applied)
    }

    async fn force_payment_success(
        &self,
        user: UserId,
        order: OrderId,
        receipt: &str,
    ) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET payment_state = $3,
                status = CASE WHEN status = $4 THEN $5 ELSE status END
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(order.as_uuid())
        .bind(user.as_uuid())
        .bind(PaymentState::Completed.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(OrderStatus::Processing.as_str())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, receipt_number = $3
            WHERE id = (
                SELECT id FROM payments
                WHERE order_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            )
            "#,
        )
        .bind(order.as_uuid())
        .bind(AttemptStatus::Success.as_str())
        .bind(receipt)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.find_order(user, order).await
    }
}
