use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use curio_core::domain::item::{Item, ItemId, Rating};
use curio_core::domain::order::{Order, OrderId, OrderLine};
use curio_core::recommendations::{CatalogStore, StoreResult};

use super::{CatalogRepository, RepositoryError, VIEW_HISTORY_LIMIT};
use crate::DbPool;

const ITEM_COLUMNS: &str = "id, name, price, category, image, rating_average, rating_count, \
                            in_stock, discount, created_at";

/// SQLite-backed catalog.
///
/// Every listing query except lookup by id is restricted to in-stock items.
/// Orderings end with `id` so that equal sort keys come back in a stable order.
#[derive(Clone)]
pub struct SqlCatalogStore {
    pool: DbPool,
}

impl SqlCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn orders_by_user(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT o.id AS order_id, o.user_id, o.total, o.created_at,
                    l.item_id, l.quantity, l.unit_price
             FROM customer_order o
             LEFT JOIN order_line l ON l.order_id = o.id
             WHERE o.user_id = ?1
             ORDER BY o.created_at, o.id, l.line_no",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders: Vec<Order> = Vec::new();
        for row in &rows {
            let order_id: String = column(row, "order_id")?;
            let starts_new_order = orders.last().map_or(true, |order| order.id.0 != order_id);
            if starts_new_order {
                let created_at: String = column(row, "created_at")?;
                orders.push(Order {
                    id: OrderId(order_id),
                    user_id: column(row, "user_id")?,
                    lines: Vec::new(),
                    total: column(row, "total")?,
                    created_at: parse_timestamp("customer_order.created_at", &created_at)?,
                });
            }

            let item_id: Option<String> = column(row, "item_id")?;
            if let (Some(item_id), Some(order)) = (item_id, orders.last_mut()) {
                let quantity: i64 = column(row, "quantity")?;
                order.lines.push(OrderLine {
                    item_id: ItemId(item_id),
                    quantity: u32::try_from(quantity).map_err(|_| {
                        RepositoryError::Decode(format!("order_line.quantity: {quantity}"))
                    })?,
                    unit_price: column(row, "unit_price")?,
                });
            }
        }

        Ok(orders)
    }

    pub async fn viewed_item_ids(&self, user_id: &str) -> Result<Vec<ItemId>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT item_id, MAX(viewed_at) AS last_viewed_at
             FROM item_view
             WHERE user_id = ?1
             GROUP BY item_id
             ORDER BY last_viewed_at DESC, item_id
             LIMIT ?2",
        )
        .bind(user_id)
        .bind(sql_limit(VIEW_HISTORY_LIMIT))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| column(row, "item_id").map(ItemId)).collect()
    }

    /// Items for `ids` in no particular order, regardless of stock.
    pub async fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM item WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_item).collect()
    }

    pub async fn items_by_category(
        &self,
        categories: &[String],
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {ITEM_COLUMNS} FROM item WHERE in_stock = 1 AND category IN ("
        ));
        let mut separated = builder.separated(", ");
        for category in categories {
            separated.push_bind(category.as_str());
        }
        separated.push_unseparated(")");
        builder.push(" ORDER BY rating_count DESC, id LIMIT ");
        builder.push_bind(sql_limit(limit));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_item).collect()
    }

    pub async fn items_by_price_range(
        &self,
        min: f64,
        max: f64,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM item
             WHERE in_stock = 1 AND price BETWEEN ?1 AND ?2
             ORDER BY id
             LIMIT ?3"
        );
        let rows = sqlx::query(&sql)
            .bind(min)
            .bind(max)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_item).collect()
    }

    pub async fn popular_items(&self, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        self.in_stock_items("rating_count DESC, rating_average DESC, id", limit).await
    }

    pub async fn recent_items(&self, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        self.in_stock_items("created_at DESC, rating_average DESC, id", limit).await
    }

    pub async fn top_rated_items(&self, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        self.in_stock_items("rating_average DESC, id", limit).await
    }

    async fn in_stock_items(
        &self,
        order_by: &'static str,
        limit: usize,
    ) -> Result<Vec<Item>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM item WHERE in_stock = 1 ORDER BY {order_by} LIMIT ?1"
        );
        let rows = sqlx::query(&sql).bind(sql_limit(limit)).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_item).collect()
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn fetch_orders_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        Ok(self.orders_by_user(user_id).await?)
    }

    async fn fetch_viewed_item_ids(&self, user_id: &str) -> StoreResult<Vec<ItemId>> {
        Ok(self.viewed_item_ids(user_id).await?)
    }

    async fn fetch_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        Ok(self.items_by_ids(ids).await?)
    }

    async fn fetch_items_by_category(
        &self,
        categories: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        Ok(self.items_by_category(categories, limit).await?)
    }

    async fn fetch_items_by_price_range(
        &self,
        min: f64,
        max: f64,
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        Ok(self.items_by_price_range(min, max, limit).await?)
    }

    async fn fetch_popular_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        Ok(self.popular_items(limit).await?)
    }

    async fn fetch_recent_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        Ok(self.recent_items(limit).await?)
    }

    async fn fetch_top_rated_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        Ok(self.top_rated_items(limit).await?)
    }
}

#[async_trait]
impl CatalogRepository for SqlCatalogStore {
    async fn save_item(&self, item: Item) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO item (id, name, price, category, image, rating_average, rating_count,
                               in_stock, discount, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price = excluded.price,
                 category = excluded.category,
                 image = excluded.image,
                 rating_average = excluded.rating_average,
                 rating_count = excluded.rating_count,
                 in_stock = excluded.in_stock,
                 discount = excluded.discount,
                 created_at = excluded.created_at",
        )
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.category)
        .bind(&item.image)
        .bind(item.rating.average)
        .bind(i64::from(item.rating.count))
        .bind(item.in_stock)
        .bind(item.discount)
        .bind(item.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_order(&self, order: Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO customer_order (id, user_id, total, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 user_id = excluded.user_id,
                 total = excluded.total,
                 created_at = excluded.created_at",
        )
        .bind(&order.id.0)
        .bind(&order.user_id)
        .bind(order.total)
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM order_line WHERE order_id = ?")
            .bind(&order.id.0)
            .execute(&mut *tx)
            .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_line (order_id, line_no, item_id, quantity, unit_price)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&order.id.0)
            .bind(position as i64 + 1)
            .bind(line.item_id.as_str())
            .bind(i64::from(line.quantity))
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn record_view(
        &self,
        user_id: &str,
        item_id: &ItemId,
        viewed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO item_view (user_id, item_id, viewed_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(item_id.as_str())
            .bind(viewed_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{field} `{raw}`: {e}")))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn row_to_item(row: &SqliteRow) -> Result<Item, RepositoryError> {
    let rating_count: i64 = column(row, "rating_count")?;
    let in_stock: i64 = column(row, "in_stock")?;
    let created_at: String = column(row, "created_at")?;

    Ok(Item {
        id: ItemId(column(row, "id")?),
        name: column(row, "name")?,
        price: column(row, "price")?,
        category: column(row, "category")?,
        image: column(row, "image")?,
        rating: Rating {
            average: column(row, "rating_average")?,
            count: u32::try_from(rating_count).map_err(|_| {
                RepositoryError::Decode(format!("item.rating_count out of range: {rating_count}"))
            })?,
        },
        in_stock: in_stock != 0,
        discount: column(row, "discount")?,
        created_at: parse_timestamp("item.created_at", &created_at)?,
    })
}
