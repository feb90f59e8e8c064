// Items module
// Menu items belonging to a shop

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{
    CreateItemRequest, Item, ItemChanges, ItemEnvelope, ItemListEnvelope, NewItem,
    UpdateItemRequest,
};
pub use repository::{ItemRepository, ItemStore};
pub use service::ItemService;
