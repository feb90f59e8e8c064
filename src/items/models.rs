use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{
    validate_category, validate_food_type, validate_not_blank, validate_positive_price,
};

/// Domain model representing a menu item
///
/// An item has no owner field of its own; its owner is the owner of `shop_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    pub shop_id: i32,
    pub name: String,
    pub image_url: String,
    pub price: Decimal,
    pub category: String,
    pub food_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating an item in a shop
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[validate(url(message = "Image must be a URL"))]
    pub image_url: String,
    #[validate(custom = "validate_positive_price")]
    pub price: Decimal,
    #[validate(custom = "validate_category")]
    pub category: String,
    #[validate(custom = "validate_food_type")]
    pub food_type: String,
}

/// Request DTO for updating an item
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(url(message = "Image must be a URL"))]
    pub image_url: Option<String>,
    #[validate(custom = "validate_positive_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_category")]
    pub category: Option<String>,
    #[validate(custom = "validate_food_type")]
    pub food_type: Option<String>,
}

/// Insert payload for the item store
#[derive(Debug, Clone)]
pub struct NewItem {
    pub shop_id: i32,
    pub name: String,
    pub image_url: String,
    pub price: Decimal,
    pub category: String,
    pub food_type: String,
}

impl NewItem {
    /// Build the insert payload for an item of `shop_id`
    pub fn from_request(shop_id: i32, request: CreateItemRequest) -> Self {
        Self {
            shop_id,
            name: request.name,
            image_url: request.image_url,
            price: request.price,
            category: request.category,
            food_type: request.food_type,
        }
    }
}

/// Field changes for an existing item
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub food_type: Option<String>,
}

impl From<UpdateItemRequest> for ItemChanges {
    fn from(request: UpdateItemRequest) -> Self {
        Self {
            name: request.name,
            image_url: request.image_url,
            price: request.price,
            category: request.category,
            food_type: request.food_type,
        }
    }
}

/// Single-item envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemEnvelope {
    pub success: bool,
    pub message: String,
    pub data: Item,
}

/// Item list envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemListEnvelope {
    pub success: bool,
    pub total: usize,
    pub data: Vec<Item>,
}
