use sqlx::PgPool;

/// Shared by every request; the pool is the only mutable resource and it
/// synchronizes itself.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
