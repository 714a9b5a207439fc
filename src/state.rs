// src/state.rs
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::orders::OrderNumberGenerator;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub order_numbers: Arc<OrderNumberGenerator>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: Config) -> Self {
        Self {
            db_pool,
            config: Arc::new(config),
            order_numbers: Arc::new(OrderNumberGenerator::default()),
        }
    }
}
