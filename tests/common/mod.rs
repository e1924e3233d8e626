#![allow(dead_code)]

use axum::{
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use flota::config::Config;
use flota::router::FleetState;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

/// One throwaway installation: its own directory, database and backups.
pub struct Install {
    pub dir: TempDir,
    pub cfg: Config,
}

impl Install {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut cfg = Config::default();
        cfg.basic.database_path = dir.path().join("data").join("flota_vehicular.db");
        cfg.basic.backup_dir = dir.path().join("backups");
        // keep Argon2 cheap in tests
        cfg.hashing.memory_kib = 256;
        cfg.hashing.iterations = 1;
        cfg.hashing.parallelism = 1;
        Self { dir, cfg }
    }

    pub fn db_path(&self) -> PathBuf {
        self.cfg.basic.database_path.clone()
    }

    pub async fn open(&self) -> FleetState {
        FleetState::open(&self.cfg)
            .await
            .expect("failed to open fleet state")
    }
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::empty())
        .expect("failed to build request")
}

/// `name=value` part of the first `Set-Cookie` header, if any.
pub fn session_cookie_of(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}

pub async fn body_text(resp: Response<Body>) -> String {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(body.to_vec()).expect("response body was not utf-8")
}
