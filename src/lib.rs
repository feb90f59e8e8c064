pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod items;
pub mod memory;
pub mod notify;
pub mod shops;
pub mod validation;


use std::sync::Arc;

use axum::{
    extract::FromRef,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use auth::{
    handlers as user_handlers,
    models::{
        AuthVerifyResponse, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
        ResetPasswordRequest, Role, SignupRequest, SignupResponse, UpdateUserRequest,
        UserEnvelope, UserListEnvelope, UserResponse, VerifyOtpRequest,
    },
    AuthContext, AuthService, OtpService, TokenService, UserRepository, UserStore,
};
use items::{
    handlers as item_handlers, CreateItemRequest, Item, ItemEnvelope, ItemListEnvelope,
    ItemRepository, ItemService, ItemStore, UpdateItemRequest,
};
use memory::MemoryStore;
use notify::Dispatcher;
use shops::{
    handlers as shop_handlers, CreateShopRequest, Shop, ShopEnvelope, ShopListEnvelope,
    ShopRepository, ShopService, ShopStore, UpdateShopRequest,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        user_handlers::signup,
        user_handlers::login,
        user_handlers::update_user,
        user_handlers::get_user,
        user_handlers::get_all_users,
        user_handlers::delete_user,
        user_handlers::forgot_password,
        user_handlers::verify_otp,
        user_handlers::reset_password,
        user_handlers::verify_auth,
        shop_handlers::add_shop,
        shop_handlers::update_shop,
        shop_handlers::get_shop,
        shop_handlers::get_all_shops,
        shop_handlers::delete_shop,
        item_handlers::add_item,
        item_handlers::update_item,
        item_handlers::get_item,
        item_handlers::get_items,
        item_handlers::delete_item,
    ),
    components(
        schemas(
            Role, UserResponse, SignupRequest, LoginRequest, UpdateUserRequest,
            ForgotPasswordRequest, VerifyOtpRequest, ResetPasswordRequest, SignupResponse,
            LoginResponse, UserEnvelope, UserListEnvelope, MessageResponse, AuthVerifyResponse,
            Shop, CreateShopRequest, UpdateShopRequest, ShopEnvelope, ShopListEnvelope,
            Item, CreateItemRequest, UpdateItemRequest, ItemEnvelope, ItemListEnvelope
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Accounts, login and password reset"),
        (name = "shops", description = "Shop management endpoints"),
        (name = "items", description = "Menu item management endpoints")
    ),
    info(
        title = "Shop API",
        version = "1.0.0",
        description = "Multi-tenant shop and menu item API with JWT authentication"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// The three stores behind the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub shops: Arc<dyn ShopStore>,
    pub items: Arc<dyn ItemStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            shops: Arc::new(ShopRepository::new(pool.clone())),
            items: Arc::new(ItemRepository::new(pool)),
        }
    }

    /// All three stores backed by one shared in-memory state
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            shops: store.clone(),
            items: store,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthContext,
    pub auth_service: AuthService,
    pub otp_service: OtpService,
    pub shop_service: ShopService,
    pub item_service: ItemService,
}

impl AppState {
    pub fn new(stores: Stores, tokens: TokenService, dispatcher: Dispatcher) -> Self {
        let tokens = Arc::new(tokens);

        Self {
            auth: AuthContext::new(tokens.clone(), stores.users.clone()),
            auth_service: AuthService::new(stores.users.clone(), tokens, dispatcher.clone()),
            otp_service: OtpService::new(stores.users, dispatcher),
            shop_service: ShopService::new(stores.shops.clone()),
            item_service: ItemService::new(stores.items, stores.shops),
        }
    }
}

impl FromRef<AppState> for AuthContext {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(user_handlers::signup))
        .route("/login", post(user_handlers::login))
        .route("/updateuser/:id", put(user_handlers::update_user))
        .route("/getuser/:id", get(user_handlers::get_user))
        .route("/getalluser", get(user_handlers::get_all_users))
        .route("/deleteuser/:id", delete(user_handlers::delete_user))
        .route("/forgot-password", post(user_handlers::forgot_password))
        .route("/verify-otp", post(user_handlers::verify_otp))
        .route("/reset-password", post(user_handlers::reset_password))
        .route("/verify-auth", get(user_handlers::verify_auth))
}

fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/addshop", post(shop_handlers::add_shop))
        .route("/updateshop/:id", put(shop_handlers::update_shop))
        .route("/getshopbyID/:id", get(shop_handlers::get_shop))
        .route("/getallshop", get(shop_handlers::get_all_shops))
        .route("/deleteshop/:id", delete(shop_handlers::delete_shop))
}

fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/addItem/:shop_id", post(item_handlers::add_item))
        .route("/updateItem/:item_id", put(item_handlers::update_item))
        .route("/getItem/:item_id", get(item_handlers::get_item))
        .route("/getItems/:shop_id", get(item_handlers::get_items))
        .route("/deleteItem/:item_id", delete(item_handlers::delete_item))
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/user", user_routes())
        .nest("/shop", shop_routes())
        .nest("/item", item_routes())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
