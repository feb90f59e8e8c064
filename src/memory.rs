//! In-memory store for single-process deployments and tests.
//!
//! All three store traits share one `RwLock`, so every mutation, including
//! OTP consumption and cascading deletes, happens under a single write guard.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::auth::{
    error::AuthError,
    models::{NewUser, PendingOtp, User, UserChanges},
    repository::UserStore,
};
use crate::error::ApiError;
use crate::items::{Item, ItemChanges, ItemStore, NewItem};
use crate::shops::{NewShop, Shop, ShopChanges, ShopStore};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i32, User>,
    shops: BTreeMap<i32, Shop>,
    items: BTreeMap<i32, Item>,
    last_user_id: i32,
    last_shop_id: i32,
    last_item_id: i32,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }

    fn user_by_email_mut(&mut self, email: &str) -> Option<&mut User> {
        self.users.values_mut().find(|user| user.email == email)
    }

    fn remove_shop(&mut self, shop_id: i32) -> bool {
        let existed = self.shops.remove(&shop_id).is_some();
        if existed {
            self.items.retain(|_, item| item.shop_id != shop_id);
        }
        existed
    }
}

/// Shared in-memory store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, AuthError> {
        let mut state = self.state.write().await;

        if state.email_taken(&user.email, None) {
            return Err(AuthError::EmailAlreadyExists);
        }

        state.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.last_user_id,
            username: user.username,
            phone: user.phone,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            otp: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update_fields(&self, id: i32, changes: UserChanges) -> Result<Option<User>, AuthError> {
        let mut state = self.state.write().await;

        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(AuthError::EmailAlreadyExists);
            }
        }

        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, AuthError> {
        let mut state = self.state.write().await;

        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<i32> = state
            .shops
            .values()
            .filter(|shop| shop.owner_id == id)
            .map(|shop| shop.id)
            .collect();
        for shop_id in owned {
            state.remove_shop(shop_id);
        }

        Ok(true)
    }

    async fn set_otp(&self, id: i32, otp: PendingOtp) -> Result<bool, AuthError> {
        let mut state = self.state.write().await;

        match state.users.get_mut(&id) {
            Some(user) => {
                user.otp = Some(otp);
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_valid_otp(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError> {
        let state = self.state.read().await;

        Ok(state
            .users
            .values()
            .find(|user| {
                user.email == email
                    && user.otp.as_ref().is_some_and(|otp| otp.accepts(code, now))
            })
            .cloned())
    }

    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError> {
        let mut state = self.state.write().await;

        let Some(user) = state.user_by_email_mut(email) else {
            return Ok(None);
        };
        if !user.otp.as_ref().is_some_and(|otp| otp.accepts(code, now)) {
            return Ok(None);
        }

        user.password_hash = new_password_hash.to_string();
        user.otp = None;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn insert(&self, shop: NewShop) -> Result<Shop, ApiError> {
        let mut state = self.state.write().await;

        state.last_shop_id += 1;
        let now = Utc::now();
        let created = Shop {
            id: state.last_shop_id,
            owner_id: shop.owner_id,
            name: shop.name,
            city: shop.city,
            state: shop.state,
            address: shop.address,
            image_url: shop.image_url,
            created_at: now,
            updated_at: now,
        };
        state.shops.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Shop>, ApiError> {
        Ok(self.state.read().await.shops.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Shop>, ApiError> {
        Ok(self.state.read().await.shops.values().cloned().collect())
    }

    async fn update(&self, id: i32, changes: ShopChanges) -> Result<Option<Shop>, ApiError> {
        let mut state = self.state.write().await;

        let Some(shop) = state.shops.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            shop.name = name;
        }
        if let Some(city) = changes.city {
            shop.city = city;
        }
        if let Some(region) = changes.state {
            shop.state = region;
        }
        if let Some(address) = changes.address {
            shop.address = address;
        }
        if let Some(image_url) = changes.image_url {
            shop.image_url = image_url;
        }
        shop.updated_at = Utc::now();

        Ok(Some(shop.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        Ok(self.state.write().await.remove_shop(id))
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn insert(&self, item: NewItem) -> Result<Item, ApiError> {
        let mut state = self.state.write().await;

        state.last_item_id += 1;
        let now = Utc::now();
        let created = Item {
            id: state.last_item_id,
            shop_id: item.shop_id,
            name: item.name,
            image_url: item.image_url,
            price: item.price,
            category: item.category,
            food_type: item.food_type,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Item>, ApiError> {
        Ok(self.state.read().await.items.get(&id).cloned())
    }

    async fn list_by_shop(&self, shop_id: i32) -> Result<Vec<Item>, ApiError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .values()
            .filter(|item| item.shop_id == shop_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i32, changes: ItemChanges) -> Result<Option<Item>, ApiError> {
        let mut state = self.state.write().await;

        let Some(item) = state.items.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            item.name = name;
        }
        if let Some(image_url) = changes.image_url {
            item.image_url = image_url;
        }
        if let Some(price) = changes.price {
            item.price = price;
        }
        if let Some(category) = changes.category {
            item.category = category;
        }
        if let Some(food_type) = changes.food_type {
            item.food_type = food_type;
        }
        item.updated_at = Utc::now();

        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        Ok(self.state.write().await.items.remove(&id).is_some())
    }
}
