//! File storage service backed by pooled, resilient data access
//!
//! A small storage service records uploaded files in the relational store and
//! caches their metadata:
//! - Settings parsed from JSON, as a host application would load them
//! - Uploads written in a transaction (row + audit entry, all or nothing)
//! - Read-through metadata cache with per-namespace TTLs
//! - Injected backend faults absorbed by retries, cache failures kept soft
//! - Health reports and a graceful shutdown
//!
//! Run with: cargo run -p depot --example storage_service --features chaos

use depot::chaos::{FaultConfig, FaultInjector, MemoryConnection, MemoryDatabase, MemoryKv};
use depot::settings::AccessSettings;
use depot::{AccessError, DataAccess, TransactionError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FileMeta {
    id: String,
    name: String,
    size: u64,
}

type Access = DataAccess<MemoryDatabase, MemoryKv>;

const SETTINGS: &str = r#"{
    "relational": { "name": "postgres", "capacity": 4, "max_overflow": 2, "acquire_timeout_ms": 500 },
    "cache": { "name": "redis", "capacity": 2, "max_overflow": 1, "acquire_timeout_ms": 200 },
    "retry": { "max_attempts": 4, "base_delay_ms": 5, "retryable": ["connection", "timeout"] },
    "namespaces": [
        { "name": "file", "ttl_seconds": 3600 },
        { "name": "session", "ttl_seconds": 86400 },
        { "name": "upload", "ttl_seconds": 300 }
    ],
    "health": { "interval_ms": 1000, "timeout_ms": 250, "degraded_threshold_ms": 50 }
}"#;

async fn record_upload(access: &Access, meta: &FileMeta) -> Result<(), TransactionError<AccessError>> {
    let row = serde_json::to_string(meta).map_err(|e| AccessError::validation(e.to_string()));
    let row = match row {
        Ok(row) => row,
        Err(err) => return Err(TransactionError::Aborted(err)),
    };
    let id = meta.id.clone();

    access
        .transaction(move |conn: &mut MemoryConnection| {
            Box::pin(async move {
                conn.insert("files", &id, &row).await?;
                conn.insert("audit", &format!("upload-{id}"), "created").await
            })
        })
        .await
}

async fn load_file(access: &Access, id: &str) -> Option<FileMeta> {
    match access.cache().get::<FileMeta>("file", id).await {
        Ok(Some(cached)) => {
            if let Some(meta) = cached.value() {
                println!("  [cache] hit for file:{id}");
                return Some(meta);
            }
        }
        Ok(None) => println!("  [cache] miss for file:{id}"),
        Err(err) => println!("  [cache] unavailable ({err}), reading the database"),
    }

    let id_owned = id.to_string();
    let row = access
        .transaction(move |conn: &mut MemoryConnection| {
            Box::pin(async move { conn.get("files", &id_owned).await })
        })
        .await
        .ok()
        .flatten()?;
    let meta: FileMeta = serde_json::from_str(&row).ok()?;

    if let Err(err) = access.cache().set("file", id, &meta, None).await {
        println!("  [cache] could not populate file:{id} ({err})");
    }
    Some(meta)
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug with `--features chaos,tracing` to see pool and retry logs.
    tracing_subscriber::fmt::init();

    println!("=== Storage service ===\n");

    let settings: AccessSettings = match serde_json::from_str(SETTINGS) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("invalid settings: {err}");
            return;
        }
    };

    let db_faults = FaultInjector::new(
        FaultConfig::builder()
            .name("postgres-chaos")
            .error_rate(0.2)
            .latency_rate(0.3)
            .latency(Duration::from_millis(1), Duration::from_millis(20))
            .seed(7)
            .build(),
    );
    let db = MemoryDatabase::with_faults(db_faults);
    let kv = MemoryKv::new();

    let access = match DataAccess::from_settings(db.clone(), kv.clone(), settings) {
        Ok(access) => access,
        Err(err) => {
            eprintln!("invalid settings: {err}");
            return;
        }
    };
    access.start_background();

    println!("--- Recording uploads (20% injected connection faults) ---");
    for n in 1..=5 {
        let meta = FileMeta {
            id: n.to_string(),
            name: format!("report-{n}.pdf"),
            size: 1024 * n,
        };
        match record_upload(&access, &meta).await {
            Ok(()) => println!("  stored {}", meta.name),
            Err(err) => println!("  upload {} failed: {err}", meta.name),
        }
    }
    println!(
        "  rows: {}, audit entries: {}, commits: {}, rollbacks: {}\n",
        db.row_count("files"),
        db.row_count("audit"),
        db.commits(),
        db.rollbacks()
    );

    println!("--- Duplicate upload rolls back both writes ---");
    let duplicate = FileMeta {
        id: "1".into(),
        name: "report-1.pdf".into(),
        size: 1,
    };
    if let Err(err) = record_upload(&access, &duplicate).await {
        println!("  rejected: {err} (rolled back: {})\n", err.is_rolled_back());
    }

    println!("--- Read-through cache ---");
    for _ in 0..2 {
        if let Some(meta) = load_file(&access, "2").await {
            println!("  file:2 -> {} ({} bytes)", meta.name, meta.size);
        }
    }
    let stats = access.cache().get_stats();
    println!(
        "  hits: {}, misses: {}, hit rate: {:.0}%\n",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0
    );

    println!("--- Cache outage stays soft ---");
    kv.faults().set_outage(true);
    if let Some(meta) = load_file(&access, "3").await {
        println!("  file:3 -> {} served from the database", meta.name);
    }

    let report = access.check_health().await;
    println!("\n--- Health: {} ---", report.status);
    for target in &report.targets {
        println!(
            "  {:<10} {:<10} {:?} {}",
            target.name,
            target.status,
            target.latency,
            target.error.as_deref().unwrap_or("")
        );
    }
    kv.faults().set_outage(false);

    let shutdown = access.shutdown().await;
    println!(
        "\n--- Shutdown: clean = {}, relational drained {}, cache drained {} ---",
        shutdown.is_clean(),
        shutdown.relational.drained,
        shutdown.cache.drained
    );
}
