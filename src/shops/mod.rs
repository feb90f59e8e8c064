// Shops module
// Shop records owned by shop-owner accounts

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{
    CreateShopRequest, NewShop, Shop, ShopChanges, ShopEnvelope, ShopListEnvelope,
    UpdateShopRequest,
};
pub use repository::{ShopRepository, ShopStore};
pub use service::ShopService;
