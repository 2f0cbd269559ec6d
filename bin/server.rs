// School Records - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use school_records::api::{build_router, AppState};
use school_records::{admin, open_database, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 School Records - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::from_env();

    // Open database (created on first start)
    let conn = open_database(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    admin::ensure_admin(&conn, &config.admin_password)?;
    println!("✓ Database opened: {}", config.db_path.display());

    let state = AppState::new(conn, &config);
    let app = build_router(state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(config.addr.as_str())
        .await
        .with_context(|| format!("Failed to bind to {}", config.addr))?;

    info!(addr = %config.addr, "server listening");
    println!("\n🚀 Server running on http://{}", config.addr);
    println!("   API: http://{}/api/students/list", config.addr);
    if let Some(dir) = &config.static_dir {
        println!("   UI:  serving {}", dir.display());
    }
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
