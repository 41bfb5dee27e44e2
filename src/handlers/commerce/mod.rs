pub mod carts;
pub mod categories;
pub mod checkout;
pub mod products;
