//! Shared fixtures for katalog-media integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;

use katalog_media::db::{self, SqliteCatalog};
use katalog_media::services::object_store::{ObjectStore, StoreError, StoreHealth};
use katalog_media::services::{FetchError, ImageFetcher};

pub const STORE_BASE_URL: &str = "https://storage.test/katalog-photos";

/// Fresh in-memory catalog with the schema applied
pub async fn memory_catalog() -> SqliteCatalog {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
    db::init_tables(&pool).await.unwrap();
    SqliteCatalog::new(pool)
}

pub async fn insert_single(pool: &SqlitePool, name: &str, url: Option<&str>) -> i64 {
    sqlx::query("INSERT INTO produk (nama_produk, foto_utama) VALUES (?, ?)")
        .bind(name)
        .bind(url)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_bundle(pool: &SqlitePool, name: &str, url: Option<&str>) -> i64 {
    sqlx::query("INSERT INTO paket_produk (nama_paket, foto_utama) VALUES (?, ?)")
        .bind(name)
        .bind(url)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn photo_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM foto_produk")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Encoded solid-colour image
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Png)
}

/// Fetcher serving canned responses; unknown URLs answer 404
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    inaccessible: HashSet<String>,
    fetched: Mutex<Vec<String>>,
    probed: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    /// Probe answers false for `url` even if it has a body
    pub fn with_inaccessible(mut self, url: &str) -> Self {
        self.inaccessible.insert(url.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.bodies.get(url).cloned().ok_or(FetchError::BadStatus(404))
    }

    async fn probe_accessible(&self, url: &str) -> bool {
        self.probed.lock().unwrap().push(url.to_string());
        self.bodies.contains_key(url) && !self.inaccessible.contains(url)
    }
}

/// In-memory object store recording every call
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_uploads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn put(&self, key: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, "image/jpeg".to_string()));
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String, StoreError> {
        self.uploads.lock().unwrap().push(key.to_string());
        if self.fail_uploads {
            return Err(StoreError::Unavailable("bucket offline".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(format!("{}/{}", STORE_BASE_URL, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push(key.to_string());
        match self.objects.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn check_connection(&self) -> StoreHealth {
        StoreHealth {
            reachable: !self.fail_uploads,
            container_exists: !self.fail_uploads,
            error: self.fail_uploads.then(|| "bucket offline".to_string()),
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(STORE_BASE_URL)?
            .strip_prefix('/')
            .map(str::to_string)
    }
}
