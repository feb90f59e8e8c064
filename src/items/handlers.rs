// HTTP handlers for item endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::{middleware::AuthenticatedUser, models::MessageResponse};
use crate::error::ApiError;
use crate::items::{CreateItemRequest, ItemEnvelope, ItemListEnvelope, UpdateItemRequest};
use crate::AppState;

/// Handler for POST /item/addItem/:shopId
#[utoipa::path(
    post,
    path = "/item/addItem/{shopId}",
    params(("shopId" = i32, Path, description = "Shop ID")),
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemEnvelope),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the shop owner"),
        (status = 404, description = "Shop not found")
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn add_item(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(shop_id): Path<i32>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemEnvelope>), ApiError> {
    let Json(request) = payload?;
    let item = state.item_service.create(&actor, shop_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemEnvelope {
            success: true,
            message: "Item created successfully".to_string(),
            data: item,
        }),
    ))
}

/// Handler for PUT /item/updateItem/:itemId
#[utoipa::path(
    put,
    path = "/item/updateItem/{itemId}",
    params(("itemId" = i32, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemEnvelope),
        (status = 403, description = "Not the shop owner"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(item_id): Path<i32>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<ItemEnvelope>, ApiError> {
    let Json(request) = payload?;
    let item = state.item_service.update(&actor, item_id, request).await?;

    Ok(Json(ItemEnvelope {
        success: true,
        message: "Item updated successfully".to_string(),
        data: item,
    }))
}

/// Handler for GET /item/getItem/:itemId
#[utoipa::path(
    get,
    path = "/item/getItem/{itemId}",
    params(("itemId" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "The item", body = ItemEnvelope),
        (status = 403, description = "Neither the shop owner nor an admin"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> Result<Json<ItemEnvelope>, ApiError> {
    let item = state.item_service.get(&actor, item_id).await?;

    Ok(Json(ItemEnvelope {
        success: true,
        message: "Item fetched successfully".to_string(),
        data: item,
    }))
}

/// Handler for GET /item/getItems/:shopId
#[utoipa::path(
    get,
    path = "/item/getItems/{shopId}",
    params(("shopId" = i32, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Items of the shop", body = ItemListEnvelope),
        (status = 404, description = "Shop not found")
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn get_items(
    State(state): State<AppState>,
    _actor: AuthenticatedUser,
    Path(shop_id): Path<i32>,
) -> Result<Json<ItemListEnvelope>, ApiError> {
    let items = state.item_service.list_by_shop(shop_id).await?;

    Ok(Json(ItemListEnvelope {
        success: true,
        total: items.len(),
        data: items,
    }))
}

/// Handler for DELETE /item/deleteItem/:itemId
#[utoipa::path(
    delete,
    path = "/item/deleteItem/{itemId}",
    params(("itemId" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 403, description = "Not the shop owner"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.item_service.delete(&actor, item_id).await?;
    Ok(Json(MessageResponse::new("Item deleted successfully")))
}
