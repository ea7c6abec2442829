//! Postgres backend.
//!
//! Carts and orders are stored as JSONB documents with a few indexed columns
//! beside them; products, batches, stores and customers are relational rows
//! because checkout locks and updates them individually.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{Repository, UnitOfWork};
use crate::domain::aggregates::{
    Cart, Customer, InventoryBatch, Order, Product, ProductStatus, SalesMetrics, ShoppingStats, StockLevel, Store,
    WebsiteSettings,
};
use crate::domain::snapshots::{Branding, SocialHandles};
use crate::domain::value_objects::{Money, Sku};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    total_orders: i32,
    total_spent: Decimal,
    average_order_value: Decimal,
    last_order_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StorefrontError;
    fn try_from(row: CustomerRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            stats: ShoppingStats {
                total_orders: count(row.total_orders, "customers.total_orders")?,
                total_spent: Money::new(row.total_spent),
                average_order_value: Money::new(row.average_order_value),
                last_order_at: row.last_order_at,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    slug: String,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    social_media: Json<SocialHandles>,
    branding: Json<Branding>,
    website_enabled: bool,
    website_order_count: i64,
    website_last_visit: Option<DateTime<Utc>>,
    total_sales: i64,
    total_revenue: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = StorefrontError;
    fn try_from(row: StoreRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            phone: row.phone,
            email: row.email,
            address: row.address,
            social_media: row.social_media.0,
            branding: row.branding.0,
            website: WebsiteSettings {
                enabled: row.website_enabled,
                order_count: wide_count(row.website_order_count, "stores.website_order_count")?,
                last_visit: row.website_last_visit,
            },
            sales: SalesMetrics {
                total_sales: wide_count(row.total_sales, "stores.total_sales")?,
                total_revenue: Money::new(row.total_revenue),
            },
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    store_id: Uuid,
    sku: String,
    name: String,
    image: Option<String>,
    category: Option<String>,
    unit: String,
    price: Decimal,
    status: String,
    web_visible: bool,
    quantity_in_stock: i32,
    sold_quantity: i32,
    total_stocked_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StorefrontError;
    fn try_from(row: ProductRow) -> Result<Self> {
        let sku = Sku::new(&row.sku).map_err(|e| corrupt(format!("products.sku {:?}: {e}", row.sku)))?;
        let status = ProductStatus::parse(&row.status).ok_or_else(|| corrupt(format!("products.status {:?}", row.status)))?;
        let stock = StockLevel::restore(
            count(row.quantity_in_stock, "products.quantity_in_stock")?,
            count(row.sold_quantity, "products.sold_quantity")?,
            count(row.total_stocked_quantity, "products.total_stocked_quantity")?,
        )?;
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            sku,
            name: row.name,
            image: row.image,
            category: row.category,
            unit: row.unit,
            price: Money::new(row.price),
            status,
            web_visible: row.web_visible,
            stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: Uuid,
    product_id: Uuid,
    batch_number: String,
    quantity_in: i32,
    quantity_sold: i32,
    cost_price: Decimal,
    date_received: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
}

impl TryFrom<BatchRow> for InventoryBatch {
    type Error = StorefrontError;
    fn try_from(row: BatchRow) -> Result<Self> {
        Ok(InventoryBatch::restore(
            row.id,
            row.product_id,
            row.batch_number,
            Money::new(row.cost_price),
            row.date_received,
            row.expiry_date,
            count(row.quantity_in, "inventory_batches.quantity_in")?,
            count(row.quantity_sold, "inventory_batches.quantity_sold")?,
        ))
    }
}

fn corrupt(detail: String) -> StorefrontError { StorefrontError::CorruptRecord(detail) }

fn count(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| corrupt(format!("{column} = {value}")))
}

fn wide_count(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| corrupt(format!("{column} = {value}")))
}

fn int_column(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| corrupt(format!("{column} overflow: {value}")))
}

fn bigint_column(value: u64, column: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| corrupt(format!("{column} overflow: {value}")))
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = StorefrontError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const UPSERT_CART: &str = "INSERT INTO carts (id, customer_id, status, document, updated_at) VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, document = EXCLUDED.document, updated_at = EXCLUDED.updated_at";

// =============================================================================
// Repository
// =============================================================================

#[async_trait]
impl Repository for PgRepository {
    async fn customer_for_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT customer_id FROM customer_sessions WHERE token = $1 AND expires_at > $2")
            .bind(token).bind(now).fetch_optional(&self.pool).await?;
        Ok(id)
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>> {
        sqlx::query_as::<_, CustomerRow>("SELECT * FROM customers WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(Customer::try_from).transpose()
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(Product::try_from).transpose()
    }

    async fn find_store(&self, id: Uuid) -> Result<Option<Store>> {
        sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(Store::try_from).transpose()
    }

    async fn find_cart_for_customer(&self, customer_id: Uuid) -> Result<Option<Cart>> {
        let doc = sqlx::query_scalar::<_, Json<Cart>>("SELECT document FROM carts WHERE customer_id = $1")
            .bind(customer_id).fetch_optional(&self.pool).await?;
        Ok(doc.map(|d| d.0))
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        let doc = sqlx::query_scalar::<_, Json<Order>>("SELECT document FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?;
        Ok(doc.map(|d| d.0))
    }

    async fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>> {
        let docs = sqlx::query_scalar::<_, Json<Order>>("SELECT document FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(customer_id).fetch_all(&self.pool).await?;
        Ok(docs.into_iter().map(|d| d.0).collect())
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(PgUnitOfWork { tx: self.pool.begin().await? }))
    }
}

// =============================================================================
// Unit of work
// =============================================================================

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn customer(&mut self, id: Uuid) -> Result<Option<Customer>> {
        sqlx::query_as::<_, CustomerRow>("SELECT * FROM customers WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *self.tx).await?.map(Customer::try_from).transpose()
    }

    async fn cart_for_update(&mut self, id: Uuid) -> Result<Option<Cart>> {
        let doc = sqlx::query_scalar::<_, Json<Cart>>("SELECT document FROM carts WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(doc.map(|d| d.0))
    }

    async fn customer_cart_for_update(&mut self, customer_id: Uuid) -> Result<Option<Cart>> {
        let doc = sqlx::query_scalar::<_, Json<Cart>>("SELECT document FROM carts WHERE customer_id = $1 FOR UPDATE")
            .bind(customer_id).fetch_optional(&mut *self.tx).await?;
        Ok(doc.map(|d| d.0))
    }

    async fn product_for_update(&mut self, id: Uuid) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *self.tx).await?.map(Product::try_from).transpose()
    }

    async fn products_for_update(&mut self, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(ids).fetch_all(&mut *self.tx).await?;
        Ok(collect::<_, Product>(rows)?.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn stores(&mut self, ids: &[Uuid]) -> Result<HashMap<Uuid, Store>> {
        let rows = sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(ids).fetch_all(&mut *self.tx).await?;
        Ok(collect::<_, Store>(rows)?.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn open_batches_for_update(&mut self, product_id: Uuid) -> Result<Vec<InventoryBatch>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            "SELECT id, product_id, batch_number, quantity_in, quantity_sold, cost_price, date_received, expiry_date \
             FROM inventory_batches WHERE product_id = $1 AND status = 'active' AND quantity_remaining > 0 \
             ORDER BY date_received, id FOR UPDATE",
        )
        .bind(product_id).fetch_all(&mut *self.tx).await?;
        collect(rows)
    }

    async fn insert_batch(&mut self, batch: &InventoryBatch) -> Result<()> {
        sqlx::query(
            "INSERT INTO inventory_batches (id, product_id, batch_number, quantity_in, quantity_sold, quantity_remaining, cost_price, date_received, expiry_date, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(batch.id).bind(batch.product_id).bind(&batch.batch_number)
        .bind(int_column(batch.quantity_in(), "quantity_in")?)
        .bind(int_column(batch.quantity_sold(), "quantity_sold")?)
        .bind(int_column(batch.quantity_remaining(), "quantity_remaining")?)
        .bind(batch.cost_price.amount()).bind(batch.date_received).bind(batch.expiry_date)
        .bind(batch.status(Utc::now()).as_str())
        .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn save_batch(&mut self, batch: &InventoryBatch) -> Result<()> {
        sqlx::query("UPDATE inventory_batches SET quantity_sold = $2, quantity_remaining = $3, status = $4 WHERE id = $1")
            .bind(batch.id)
            .bind(int_column(batch.quantity_sold(), "quantity_sold")?)
            .bind(int_column(batch.quantity_remaining(), "quantity_remaining")?)
            .bind(batch.status(Utc::now()).as_str())
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn save_product_stock(&mut self, product: &Product) -> Result<()> {
        sqlx::query("UPDATE products SET quantity_in_stock = $2, sold_quantity = $3, total_stocked_quantity = $4, updated_at = $5 WHERE id = $1")
            .bind(product.id)
            .bind(int_column(product.stock.quantity_in_stock(), "quantity_in_stock")?)
            .bind(int_column(product.stock.sold_quantity(), "sold_quantity")?)
            .bind(int_column(product.stock.total_stocked_quantity(), "total_stocked_quantity")?)
            .bind(product.updated_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<bool> {
        // DO NOTHING keeps the transaction usable after a number collision.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO orders (id, order_number, customer_id, status, subtotal, total_amount, item_count, document, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) ON CONFLICT (order_number) DO NOTHING RETURNING id",
        )
        .bind(order.id()).bind(order.order_number().as_str()).bind(order.customer_id()).bind(order.status().as_str())
        .bind(order.subtotal().amount()).bind(order.total_amount().amount())
        .bind(int_column(order.item_count(), "item_count")?)
        .bind(Json(order)).bind(order.created_at()).bind(order.updated_at())
        .fetch_optional(&mut *self.tx).await?;
        Ok(inserted.is_some())
    }

    async fn save_customer_stats(&mut self, customer: &Customer) -> Result<()> {
        let stats = &customer.stats;
        sqlx::query("UPDATE customers SET total_orders = $2, total_spent = $3, average_order_value = $4, last_order_at = $5 WHERE id = $1")
            .bind(customer.id)
            .bind(int_column(stats.total_orders, "total_orders")?)
            .bind(stats.total_spent.amount()).bind(stats.average_order_value.amount()).bind(stats.last_order_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn save_store_metrics(&mut self, store: &Store) -> Result<()> {
        sqlx::query("UPDATE stores SET total_sales = $2, total_revenue = $3, website_order_count = $4, website_last_visit = $5 WHERE id = $1")
            .bind(store.id)
            .bind(bigint_column(store.sales.total_sales, "total_sales")?)
            .bind(store.sales.total_revenue.amount())
            .bind(bigint_column(store.website.order_count, "website_order_count")?)
            .bind(store.website.last_visit)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        sqlx::query(UPSERT_CART)
            .bind(cart.id()).bind(cart.customer_id()).bind(cart.status().as_str()).bind(Json(cart)).bind(cart.updated_at())
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
