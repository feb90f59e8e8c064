use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::items::{Item, ItemChanges, NewItem};

/// Storage contract for items
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert(&self, item: NewItem) -> Result<Item, ApiError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Item>, ApiError>;

    async fn list_by_shop(&self, shop_id: i32) -> Result<Vec<Item>, ApiError>;

    /// Apply the present fields; `None` when the item does not exist
    async fn update(&self, id: i32, changes: ItemChanges) -> Result<Option<Item>, ApiError>;

    /// Remove the item; `false` when it did not exist
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}

/// Repository for database operations on items
#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    /// Create a new ItemRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn insert(&self, item: NewItem) -> Result<Item, ApiError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (shop_id, name, image_url, price, category, food_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, shop_id, name, image_url, price, category, food_type, created_at, updated_at
            "#,
        )
        .bind(item.shop_id)
        .bind(item.name)
        .bind(item.image_url)
        .bind(item.price)
        .bind(item.category)
        .bind(item.food_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Item>, ApiError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, shop_id, name, image_url, price, category, food_type, created_at, updated_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn list_by_shop(&self, shop_id: i32) -> Result<Vec<Item>, ApiError> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, shop_id, name, image_url, price, category, food_type, created_at, updated_at
            FROM items
            WHERE shop_id = $1
            ORDER BY id
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn update(&self, id: i32, changes: ItemChanges) -> Result<Option<Item>, ApiError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($1, name),
                image_url = COALESCE($2, image_url),
                price = COALESCE($3, price),
                category = COALESCE($4, category),
                food_type = COALESCE($5, food_type),
                updated_at = NOW()
            WHERE id = $6
            RETURNING id, shop_id, name, image_url, price, category, food_type, created_at, updated_at
            "#,
        )
        .bind(changes.name)
        .bind(changes.image_url)
        .bind(changes.price)
        .bind(changes.category)
        .bind(changes.food_type)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
