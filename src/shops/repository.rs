use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::shops::{NewShop, Shop, ShopChanges};

/// Storage contract for shops
#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn insert(&self, shop: NewShop) -> Result<Shop, ApiError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Shop>, ApiError>;

    async fn list_all(&self) -> Result<Vec<Shop>, ApiError>;

    /// Apply the present fields; `None` when the shop does not exist
    async fn update(&self, id: i32, changes: ShopChanges) -> Result<Option<Shop>, ApiError>;

    /// Remove the shop and its items; `false` when it did not exist
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}

/// Repository for database operations on shops
#[derive(Clone)]
pub struct ShopRepository {
    pool: PgPool,
}

impl ShopRepository {
    /// Create a new ShopRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for ShopRepository {
    async fn insert(&self, shop: NewShop) -> Result<Shop, ApiError> {
        let shop = sqlx::query_as::<_, Shop>(
            r#"
            INSERT INTO shops (owner_id, name, city, state, address, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, name, city, state, address, image_url, created_at, updated_at
            "#,
        )
        .bind(shop.owner_id)
        .bind(shop.name)
        .bind(shop.city)
        .bind(shop.state)
        .bind(shop.address)
        .bind(shop.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Shop>, ApiError> {
        let shop = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, owner_id, name, city, state, address, image_url, created_at, updated_at
            FROM shops
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn list_all(&self) -> Result<Vec<Shop>, ApiError> {
        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, owner_id, name, city, state, address, image_url, created_at, updated_at
            FROM shops
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(shops)
    }

    async fn update(&self, id: i32, changes: ShopChanges) -> Result<Option<Shop>, ApiError> {
        let shop = sqlx::query_as::<_, Shop>(
            r#"
            UPDATE shops
            SET name = COALESCE($1, name),
                city = COALESCE($2, city),
                state = COALESCE($3, state),
                address = COALESCE($4, address),
                image_url = COALESCE($5, image_url),
                updated_at = NOW()
            WHERE id = $6
            RETURNING id, owner_id, name, city, state, address, image_url, created_at, updated_at
            "#,
        )
        .bind(changes.name)
        .bind(changes.city)
        .bind(changes.state)
        .bind(changes.address)
        .bind(changes.image_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        // items go with the shop through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
