/// Commerce entities module
pub mod cart_item;
pub mod category;
pub mod product;
pub mod transaction;
pub mod transaction_item;

// Re-export entities
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use transaction::{
    Entity as Transaction, Model as TransactionModel, PaymentMethod, TransactionStatus,
};
pub use transaction_item::{Entity as TransactionItem, Model as TransactionItemModel};
