// Storefront services
pub mod commerce;

// Back-office transaction management
pub mod transactions;
pub mod users;
