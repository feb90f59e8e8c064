use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Domain model representing a shop in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shop {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a new shop
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateShopRequest {
    #[validate(
        length(min = 2, max = 200, message = "Shop name must be 2 to 200 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(url(message = "Image must be a URL"))]
    pub image_url: String,
}

/// Request DTO for updating an existing shop
///
/// Ownership is not part of the payload; unknown fields are refused.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateShopRequest {
    #[validate(
        length(min = 2, max = 200, message = "Shop name must be 2 to 200 characters"),
        custom = "validate_not_blank"
    )]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(url(message = "Image must be a URL"))]
    pub image_url: Option<String>,
}

/// Insert payload for the shop store
#[derive(Debug, Clone)]
pub struct NewShop {
    pub owner_id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub image_url: String,
}

impl NewShop {
    /// Build the insert payload for a shop owned by `owner_id`
    pub fn from_request(owner_id: i32, request: CreateShopRequest) -> Self {
        Self {
            owner_id,
            name: request.name,
            city: request.city,
            state: request.state,
            address: request.address,
            image_url: request.image_url,
        }
    }
}

/// Field changes for an existing shop
#[derive(Debug, Clone, Default)]
pub struct ShopChanges {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
}

impl From<UpdateShopRequest> for ShopChanges {
    fn from(request: UpdateShopRequest) -> Self {
        Self {
            name: request.name,
            city: request.city,
            state: request.state,
            address: request.address,
            image_url: request.image_url,
        }
    }
}

/// Single-shop envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShopEnvelope {
    pub success: bool,
    pub message: String,
    pub data: Shop,
}

/// Shop list envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShopListEnvelope {
    pub success: bool,
    pub total: usize,
    pub data: Vec<Shop>,
}
