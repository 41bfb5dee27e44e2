//! Data access for each table. Repositories are stateless: every method takes
//! the connection to run on, so the same call works against the pool or
//! inside a `DatabaseTransaction`.

pub mod cart_repository;
pub mod category_repository;
pub mod product_repository;
pub mod transaction_repository;
pub mod user_repository;

pub use cart_repository::{CartLine, CartRepository};
pub use category_repository::CategoryRepository;
pub use product_repository::ProductRepository;
pub use transaction_repository::TransactionRepository;
pub use user_repository::UserRepository;

/// 1-based page/limit window shared by list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_LIMIT: u64 = 100;

    /// Clamps caller input: page 0 becomes 1, limit is bounded to 1..=100.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Zero-based page index for `Paginator::fetch_page`
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}
