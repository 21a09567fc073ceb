pub mod catalog;
pub mod common;
pub mod order_details;
pub mod orders;
pub mod products;
pub mod public;
pub mod users;
pub mod vouchers;

use crate::db::DbPool;
use crate::services::{
    catalog::CatalogService, order_details::OrderDetailsService, orders::OrderService,
    products::ProductService, tunnel::TunnelService, users::UserService,
    vouchers::VoucherService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub orders: Arc<OrderService>,
    pub order_details: Arc<OrderDetailsService>,
    pub catalog: Arc<CatalogService>,
    pub products: Arc<ProductService>,
    pub vouchers: Arc<VoucherService>,
    pub tunnel: Arc<TunnelService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            users: Arc::new(UserService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            order_details: Arc::new(OrderDetailsService::new(db_pool.clone())),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone())),
            vouchers: Arc::new(VoucherService::new(db_pool.clone())),
            tunnel: Arc::new(TunnelService::new(db_pool)),
        }
    }
}
