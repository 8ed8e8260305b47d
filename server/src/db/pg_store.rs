// larder/server/src/db/pg_store.rs

use crate::models::coupon::COUPON_COLUMNS;
use crate::models::order::ORDER_COLUMNS;
use crate::models::product::PRODUCT_COLUMNS;
use crate::models::{AddressRow, CouponRow, OrderLineRow, OrderRow, ProductRow};
use async_trait::async_trait;
use larder::{
  Address, AddressId, CatalogStore, Coupon, CouponId, CouponStore, NewOrder, Order, OrderId, OrderLine, OrderStatus,
  OrderStore, Product, ProductId, SessionKey, SessionStore, ShopError, ShopResult, UserId,
};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{error, instrument};
use uuid::Uuid;

/// Catalog, session, coupon and order store over one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

fn db_err(e: sqlx::Error) -> ShopError {
  error!(error = %e, "Database operation failed.");
  ShopError::storage(e)
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn lines_for(&self, order_ids: &[Uuid]) -> ShopResult<HashMap<Uuid, Vec<OrderLine>>> {
    let rows: Vec<OrderLineRow> = sqlx::query_as(
      "SELECT order_id, product_id, product_name, quantity, price FROM order_lines \
       WHERE order_id = ANY($1) ORDER BY order_id, position",
    )
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;

    let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in rows {
      let order_id = row.order_id;
      by_order.entry(order_id).or_default().push(OrderLine::try_from(row)?);
    }
    Ok(by_order)
  }

  async fn with_lines(&self, rows: Vec<OrderRow>) -> ShopResult<Vec<Order>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut lines = self.lines_for(&ids).await?;
    rows
      .into_iter()
      .map(|row| {
        let order_lines = lines.remove(&row.id).unwrap_or_default();
        row.into_order(order_lines)
      })
      .collect()
  }

  async fn one_with_lines(&self, row: OrderRow) -> ShopResult<Order> {
    let mut orders = self.with_lines(vec![row]).await?;
    orders
      .pop()
      .ok_or_else(|| ShopError::storage(anyhow::anyhow!("order row vanished while loading lines")))
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn find_product(&self, id: ProductId) -> ShopResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(Product::from))
  }

  async fn list_products(&self) -> ShopResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"))
      .fetch_all(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(rows.into_iter().map(Product::from).collect())
  }
}

#[async_trait]
impl SessionStore for PgStore {
  async fn load(&self, key: &SessionKey) -> ShopResult<Option<Vec<u8>>> {
    sqlx::query_scalar("SELECT data FROM sessions WHERE key = $1")
      .bind(key.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)
  }

  async fn save(&self, key: &SessionKey, data: Vec<u8>) -> ShopResult<()> {
    sqlx::query(
      "INSERT INTO sessions (key, data, updated_at) VALUES ($1, $2, now()) \
       ON CONFLICT (key) DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
    )
    .bind(key.as_str())
    .bind(data)
    .execute(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(())
  }

  async fn delete(&self, key: &SessionKey) -> ShopResult<()> {
    sqlx::query("DELETE FROM sessions WHERE key = $1")
      .bind(key.as_str())
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(())
  }
}

#[async_trait]
impl CouponStore for PgStore {
  async fn find_by_code(&self, code: &str) -> ShopResult<Vec<Coupon>> {
    let rows: Vec<CouponRow> = sqlx::query_as(&format!(
      "SELECT {COUPON_COLUMNS} FROM coupons WHERE lower(code) = lower($1) ORDER BY end_time ASC NULLS LAST"
    ))
    .bind(code)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(Coupon::from).collect())
  }

  async fn find_coupon(&self, id: CouponId) -> ShopResult<Option<Coupon>> {
    let row: Option<CouponRow> = sqlx::query_as(&format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(Coupon::from))
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn order_number_exists(&self, order_number: &str) -> ShopResult<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
      .bind(order_number)
      .fetch_one(&self.pool)
      .await
      .map_err(db_err)
  }

  #[instrument(name = "PgStore::commit", skip_all, fields(order_number = %order.order_number, lines = order.lines.len()))]
  async fn commit(&self, order: NewOrder) -> ShopResult<Order> {
    let mut tx = self.pool.begin().await.map_err(db_err)?;

    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (id, order_number, user_id, contact, packaging_fee, coupon_id, coupon_discount, \
       discount_amount, total_price, payment_method, delivery_method, address, address_id, comment, guest_session, \
       status, paid) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, FALSE) \
       RETURNING {ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.contact.clone().map(Json))
    .bind(order.packaging_fee)
    .bind(order.coupon_id)
    .bind(order.coupon_discount)
    .bind(order.discount_amount)
    .bind(order.total_price)
    .bind(order.payment_method.as_str())
    .bind(order.delivery_method.as_str())
    .bind(&order.address)
    .bind(order.address_id)
    .bind(&order.comment)
    .bind(order.guest_session.as_ref().map(SessionKey::as_str))
    .bind(OrderStatus::Ordered.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
      sqlx::Error::Database(ref db) if db.is_unique_violation() => {
        ShopError::DuplicateOrderNumber(order.order_number.clone())
      }
      other => db_err(other),
    })?;

    for (position, line) in order.lines.iter().enumerate() {
      let quantity = i32::try_from(line.quantity).map_err(|_| ShopError::InvalidQuantity(i64::from(line.quantity)))?;
      let bumped = sqlx::query("UPDATE products SET times_ordered = times_ordered + 1 WHERE id = $1")
        .bind(line.product_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
      if bumped.rows_affected() == 0 {
        // Dropping `tx` rolls everything back.
        return Err(ShopError::not_found("Product", line.product_id));
      }

      sqlx::query(
        "INSERT INTO order_lines (order_id, product_id, product_name, quantity, price, position) \
         VALUES ($1, $2, $3, $4, $5, $6)",
      )
      .bind(row.id)
      .bind(line.product_id)
      .bind(&line.product_name)
      .bind(quantity)
      .bind(line.price)
      .bind(position as i32)
      .execute(&mut *tx)
      .await
      .map_err(db_err)?;
    }

    tx.commit().await.map_err(db_err)?;
    row.into_order(order.lines)
  }

  async fn find_order(&self, id: OrderId) -> ShopResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    match row {
      Some(row) => Ok(Some(self.one_with_lines(row).await?)),
      None => Ok(None),
    }
  }

  async fn list_for_user(&self, user_id: UserId) -> ShopResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    self.with_lines(rows).await
  }

  async fn delete_order(&self, id: OrderId) -> ShopResult<bool> {
    let done = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(done.rows_affected() > 0)
  }

  async fn update_status(&self, id: OrderId, status: OrderStatus) -> ShopResult<Order> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    let row = row.ok_or_else(|| ShopError::not_found("Order", id))?;
    self.one_with_lines(row).await
  }

  async fn mark_paid(&self, id: OrderId) -> ShopResult<Order> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET paid = TRUE WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    let row = row.ok_or_else(|| ShopError::not_found("Order", id))?;
    self.one_with_lines(row).await
  }

  async fn get_address(&self, id: AddressId) -> ShopResult<Option<Address>> {
    let row: Option<AddressRow> = sqlx::query_as("SELECT id, user_id, address FROM addresses WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(Address::from))
  }
}
