/// Commerce services: catalog, cart and checkout
pub mod cart_service;
pub mod checkout_service;
pub mod product_catalog_service;

pub use cart_service::{
    AddToCartRequest, CartItemResponse, CartResponse, CartService, UpdateCartItemRequest,
};
pub use checkout_service::{
    CheckoutPricing, CheckoutRequest, CheckoutService, CheckoutSummary, ConfirmPaymentRequest,
    TransactionItemResponse, TransactionResponse,
};
pub use product_catalog_service::{
    CategoryRequest, ProductCatalogService, ProductListQuery, ProductPage, ProductRequest,
    PublicProductResponse,
};
