use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::SystemTime;

#[derive(Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentStatus,
}

#[derive(Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
    pub latency_ms: Option<f64>,
}

static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

pub fn init_health_monitoring() {
    START_TIME.get_or_init(SystemTime::now);
}

pub async fn health_check(Extension(pool): Extension<PgPool>) -> impl IntoResponse {
    let start_time = START_TIME.get().copied().unwrap_or_else(SystemTime::now);
    let uptime = SystemTime::now().duration_since(start_time).unwrap_or_default().as_secs();

    let database = check_database(&pool).await;
    let status_code = if database.status == "operational" { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    let health = HealthStatus {
        status: if database.status == "operational" { "healthy".to_string() } else { "degraded".to_string() },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        database,
    };

    (status_code, Json(health))
}

async fn check_database(pool: &PgPool) -> ComponentStatus {
    let start = std::time::Instant::now();
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => ComponentStatus { status: "operational".to_string(), latency_ms: Some(start.elapsed().as_secs_f64() * 1000.0) },
        Err(_) => ComponentStatus { status: "degraded".to_string(), latency_ms: None },
    }
}

pub async fn readiness_check(Extension(pool): Extension<PgPool>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&pool).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "ready": true, "timestamp": Utc::now() }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "ready": false, "timestamp": Utc::now() })),
        ),
    }
}

pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "alive": true, "timestamp": Utc::now() })))
}
