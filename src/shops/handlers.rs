// HTTP handlers for shop endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::{middleware::AuthenticatedUser, models::MessageResponse};
use crate::error::ApiError;
use crate::shops::{CreateShopRequest, ShopEnvelope, ShopListEnvelope, UpdateShopRequest};
use crate::AppState;

/// Handler for POST /shop/addshop
#[utoipa::path(
    post,
    path = "/shop/addshop",
    request_body = CreateShopRequest,
    responses(
        (status = 201, description = "Shop created", body = ShopEnvelope),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Only shop owners can create shops")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn add_shop(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    payload: Result<Json<CreateShopRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShopEnvelope>), ApiError> {
    let Json(request) = payload?;
    let shop = state.shop_service.create(&actor, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShopEnvelope {
            success: true,
            message: "Shop created successfully".to_string(),
            data: shop,
        }),
    ))
}

/// Handler for PUT /shop/updateshop/:id
#[utoipa::path(
    put,
    path = "/shop/updateshop/{id}",
    params(("id" = i32, Path, description = "Shop ID")),
    request_body = UpdateShopRequest,
    responses(
        (status = 200, description = "Shop updated", body = ShopEnvelope),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Shop not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn update_shop(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateShopRequest>, JsonRejection>,
) -> Result<Json<ShopEnvelope>, ApiError> {
    let Json(request) = payload?;
    let shop = state.shop_service.update(&actor, id, request).await?;

    Ok(Json(ShopEnvelope {
        success: true,
        message: "Shop updated successfully".to_string(),
        data: shop,
    }))
}

/// Handler for GET /shop/getshopbyID/:id
#[utoipa::path(
    get,
    path = "/shop/getshopbyID/{id}",
    params(("id" = i32, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "The shop", body = ShopEnvelope),
        (status = 404, description = "Shop not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn get_shop(
    State(state): State<AppState>,
    _actor: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<ShopEnvelope>, ApiError> {
    let shop = state.shop_service.get(id).await?;

    Ok(Json(ShopEnvelope {
        success: true,
        message: "Shop fetched successfully".to_string(),
        data: shop,
    }))
}

/// Handler for GET /shop/getallshop
#[utoipa::path(
    get,
    path = "/shop/getallshop",
    responses((status = 200, description = "All shops", body = ShopListEnvelope)),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn get_all_shops(
    State(state): State<AppState>,
    _actor: AuthenticatedUser,
) -> Result<Json<ShopListEnvelope>, ApiError> {
    let shops = state.shop_service.list().await?;

    Ok(Json(ShopListEnvelope {
        success: true,
        total: shops.len(),
        data: shops,
    }))
}

/// Handler for DELETE /shop/deleteshop/:id
#[utoipa::path(
    delete,
    path = "/shop/deleteshop/{id}",
    params(("id" = i32, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Shop and its items deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Shop not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn delete_shop(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.shop_service.delete(&actor, id).await?;
    Ok(Json(MessageResponse::new("Shop deleted successfully")))
}
