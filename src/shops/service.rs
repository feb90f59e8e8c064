use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::auth::{middleware::AuthenticatedUser, policy};
use crate::error::ApiError;
use crate::shops::{CreateShopRequest, NewShop, Shop, ShopStore, UpdateShopRequest};

/// Service for shop business logic
#[derive(Clone)]
pub struct ShopService {
    shops: Arc<dyn ShopStore>,
}

impl ShopService {
    pub fn new(shops: Arc<dyn ShopStore>) -> Self {
        Self { shops }
    }

    /// Open a shop owned by the actor
    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        request: CreateShopRequest,
    ) -> Result<Shop, ApiError> {
        request.validate()?;
        policy::ensure_can_open_shop(actor)?;

        let shop = self
            .shops
            .insert(NewShop::from_request(actor.user_id, request))
            .await?;

        info!("Shop created: shop_id={}, owner_id={}", shop.id, shop.owner_id);
        Ok(shop)
    }

    pub async fn get(&self, id: i32) -> Result<Shop, ApiError> {
        self.shops
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Shop", id))
    }

    pub async fn list(&self) -> Result<Vec<Shop>, ApiError> {
        self.shops.list_all().await
    }

    /// Only the owner may change a shop
    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: i32,
        request: UpdateShopRequest,
    ) -> Result<Shop, ApiError> {
        request.validate()?;

        let shop = self.get(id).await?;
        policy::ensure_owner(actor, shop.owner_id)?;

        let updated = self
            .shops
            .update(id, request.into())
            .await?
            .ok_or_else(|| ApiError::not_found("Shop", id))?;

        info!("Shop updated: shop_id={}", id);
        Ok(updated)
    }

    /// Only the owner may delete a shop; its items go with it
    pub async fn delete(&self, actor: &AuthenticatedUser, id: i32) -> Result<(), ApiError> {
        let shop = self.get(id).await?;
        policy::ensure_owner(actor, shop.owner_id)?;

        if !self.shops.delete(id).await? {
            return Err(ApiError::not_found("Shop", id));
        }

        info!("Shop deleted: shop_id={}", id);
        Ok(())
    }
}
