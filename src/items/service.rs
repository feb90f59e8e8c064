use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::auth::{middleware::AuthenticatedUser, policy};
use crate::error::ApiError;
use crate::items::{CreateItemRequest, Item, ItemStore, NewItem, UpdateItemRequest};
use crate::shops::{Shop, ShopStore};

/// Service for item business logic
///
/// Items carry no owner; every ownership check goes item -> shop -> owner.
#[derive(Clone)]
pub struct ItemService {
    items: Arc<dyn ItemStore>,
    shops: Arc<dyn ShopStore>,
}

impl ItemService {
    pub fn new(items: Arc<dyn ItemStore>, shops: Arc<dyn ShopStore>) -> Self {
        Self { items, shops }
    }

    async fn shop(&self, shop_id: i32) -> Result<Shop, ApiError> {
        self.shops
            .find_by_id(shop_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Shop", shop_id))
    }

    /// The item together with the shop that owns it
    async fn item_with_shop(&self, item_id: i32) -> Result<(Item, Shop), ApiError> {
        let item = self
            .items
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Item", item_id))?;
        let shop = self.shop(item.shop_id).await?;
        Ok((item, shop))
    }

    /// Add an item to a shop the actor owns
    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        shop_id: i32,
        request: CreateItemRequest,
    ) -> Result<Item, ApiError> {
        request.validate()?;

        let shop = self.shop(shop_id).await?;
        policy::ensure_owner(actor, shop.owner_id)?;

        let item = self.items.insert(NewItem::from_request(shop.id, request)).await?;
        info!("Item created: item_id={}, shop_id={}", item.id, item.shop_id);
        Ok(item)
    }

    /// Read one item; the shop owner or an admin
    pub async fn get(&self, actor: &AuthenticatedUser, item_id: i32) -> Result<Item, ApiError> {
        let (item, shop) = self.item_with_shop(item_id).await?;
        policy::ensure_owner_or_admin(actor, shop.owner_id)?;
        Ok(item)
    }

    /// Items of an existing shop
    pub async fn list_by_shop(&self, shop_id: i32) -> Result<Vec<Item>, ApiError> {
        let shop = self.shop(shop_id).await?;
        self.items.list_by_shop(shop.id).await
    }

    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        item_id: i32,
        request: UpdateItemRequest,
    ) -> Result<Item, ApiError> {
        request.validate()?;

        let (_, shop) = self.item_with_shop(item_id).await?;
        policy::ensure_owner(actor, shop.owner_id)?;

        let item = self
            .items
            .update(item_id, request.into())
            .await?
            .ok_or_else(|| ApiError::not_found("Item", item_id))?;

        info!("Item updated: item_id={}", item_id);
        Ok(item)
    }

    pub async fn delete(&self, actor: &AuthenticatedUser, item_id: i32) -> Result<(), ApiError> {
        let (_, shop) = self.item_with_shop(item_id).await?;
        policy::ensure_owner(actor, shop.owner_id)?;

        if !self.items.delete(item_id).await? {
            return Err(ApiError::not_found("Item", item_id));
        }

        info!("Item deleted: item_id={}", item_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{models::{Role, UserResponse}, AuthError};
    use crate::memory::MemoryStore;
    use crate::shops::NewShop;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn actor(user_id: i32, role: Role) -> AuthenticatedUser {
        let now = Utc::now();
        AuthenticatedUser {
            user_id,
            role,
            user: UserResponse {
                id: user_id,
                username: "someone".to_string(),
                phone: "9876543210".to_string(),
                email: format!("someone{}@example.com", user_id),
                role,
                created_at: now,
                updated_at: now,
            },
        }
    }

    fn dosa() -> CreateItemRequest {
        CreateItemRequest {
            name: "Masala Dosa".to_string(),
            image_url: "https://cdn.example.com/dosa.jpg".to_string(),
            price: dec!(120.50),
            category: "South Indian".to_string(),
            food_type: "veg".to_string(),
        }
    }

    /// Service over a store holding one shop owned by user 1
    async fn setup() -> (ItemService, i32) {
        let store = Arc::new(MemoryStore::new());
        let shop = ShopStore::insert(
            &*store,
            NewShop {
                owner_id: 1,
                name: "Asha's Kitchen".to_string(),
                city: "Pune".to_string(),
                state: "Maharashtra".to_string(),
                address: "FC Road".to_string(),
                image_url: "https://cdn.example.com/shop.jpg".to_string(),
            },
        )
        .await
        .unwrap();

        (ItemService::new(store.clone(), store), shop.id)
    }

    #[tokio::test]
    async fn test_owner_chain_controls_mutation() {
        let (service, shop_id) = setup().await;
        let owner = actor(1, Role::ShopOwner);
        let stranger = actor(2, Role::ShopOwner);

        let item = service.create(&owner, shop_id, dosa()).await.unwrap();

        assert!(matches!(
            service.create(&stranger, shop_id, dosa()).await,
            Err(ApiError::Auth(AuthError::Forbidden(_)))
        ));

        let change = || UpdateItemRequest {
            name: None,
            image_url: None,
            price: Some(dec!(99)),
            category: None,
            food_type: None,
        };
        assert!(matches!(
            service.update(&stranger, item.id, change()).await,
            Err(ApiError::Auth(AuthError::Forbidden(_)))
        ));
        let updated = service.update(&owner, item.id, change()).await.unwrap();
        assert_eq!(updated.price, dec!(99));

        assert!(matches!(
            service.delete(&stranger, item.id).await,
            Err(ApiError::Auth(AuthError::Forbidden(_)))
        ));
        service.delete(&owner, item.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_reads_but_does_not_mutate() {
        let (service, shop_id) = setup().await;
        let item = service.create(&actor(1, Role::ShopOwner), shop_id, dosa()).await.unwrap();
        let admin = actor(9, Role::Admin);

        assert_eq!(service.get(&admin, item.id).await.unwrap().id, item.id);
        assert!(matches!(
            service.get(&actor(3, Role::User), item.id).await,
            Err(ApiError::Auth(AuthError::Forbidden(_)))
        ));
        assert!(matches!(
            service.delete(&admin, item.id).await,
            Err(ApiError::Auth(AuthError::Forbidden(_)))
        ));
    }

    #[tokio::test]
    async fn test_listing_requires_existing_shop() {
        let (service, shop_id) = setup().await;
        service.create(&actor(1, Role::ShopOwner), shop_id, dosa()).await.unwrap();

        assert_eq!(service.list_by_shop(shop_id).await.unwrap().len(), 1);
        assert!(matches!(
            service.list_by_shop(shop_id + 100).await,
            Err(ApiError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_item_is_rejected_before_lookup() {
        let (service, _) = setup().await;
        let mut request = dosa();
        request.price = dec!(-1);

        assert!(matches!(
            service.create(&actor(1, Role::ShopOwner), 999, request).await,
            Err(ApiError::ValidationError(_))
        ));
    }
}
