//! Unauthenticated status endpoints

use axum::Json;
use kimai_domain::constants::{APP_NAME, HOMEPAGE};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Pong {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub copyright: String,
}

pub async fn ping() -> Json<Pong> {
    Json(Pong { message: "pong" })
}

pub async fn version() -> Json<VersionInfo> {
    let version = env!("CARGO_PKG_VERSION");
    Json(VersionInfo {
        name: APP_NAME,
        version,
        copyright: format!("{APP_NAME} {version} by Kevin Papst and contributors. {HOMEPAGE}"),
    })
}
