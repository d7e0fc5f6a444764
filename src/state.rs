use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtKeys;
use crate::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt: Arc<JwtKeys>,
    pub clock: Arc<dyn Clock>,
}
