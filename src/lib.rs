pub mod config;
pub mod core;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::core::feed::LocationFeed;
use crate::store::Store;

pub use config::Config;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub feed: Arc<LocationFeed>,
    pub config: Config,
}
