mod shopping_item;
pub mod timestamp;

pub use shopping_item::{RemoteShoppingItem, ShoppingItem};
