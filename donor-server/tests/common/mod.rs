#![allow(dead_code)]

use donor_server::db::repository::donor;
use donor_server::{Config, ServerState};
use shared::models::{DonorCreate, DonorRole, PatientInfo};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// In-memory database with the real migrations
pub async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    donor_server::db::run_migrations(&pool).await.unwrap();
    pool
}

pub async fn state() -> ServerState {
    let mut config = Config::default();
    config.sweep_on_startup = false;
    ServerState::for_pool(config, pool().await)
}

pub async fn seed_donor(pool: &SqlitePool, name: &str) -> i64 {
    donor::create(
        pool,
        DonorCreate {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: Some("01700000000".into()),
            blood_group: "B+".into(),
            division: "Chattogram".into(),
            district: "Cumilla".into(),
            upazila: String::new(),
            area: String::new(),
            want_to_donate: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub fn patient() -> PatientInfo {
    PatientInfo {
        patient_name: "Rahim".into(),
        blood_group: "B+".into(),
        blood_bags_needed: 2,
    }
}

pub fn token(state: &ServerState, donor_id: i64, role: DonorRole) -> String {
    let token = state
        .jwt_service
        .generate_token(donor_id, "Tester", role)
        .unwrap();
    format!("Bearer {token}")
}
