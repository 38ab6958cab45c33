use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

// health response payload
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

// health handler
pub async fn health_handler() -> Json<Health> {
    Json(Health {
        status: "healthy",
        timestamp: Utc::now(),
    })
}
