use sealbox::{
    api::{start_api_server, ApiState},
    audit::AuditLog,
    config::AppConfig,
    observability::init_tracing,
    services::{SecretCipher, SecretService},
    storage::{create_pool, SecretStore},
    Result, APP_NAME, VERSION,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing).
    // This must happen before any config is read from environment.
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    init_tracing()?;

    info!(app_name = APP_NAME, version = VERSION, "Starting sealbox one-time secret service");

    let config = AppConfig::from_env()?;
    info!(
        server_address = %config.server.bind_address(),
        database_url = %config.database.url,
        cache_capacity = config.cache.capacity,
        cache_ttl_seconds = config.cache.ttl_seconds,
        "Loaded configuration from environment"
    );

    let pool = create_pool(&config.database).await?;

    let cipher = SecretCipher::from_config(&config.crypto)?;
    let store = SecretStore::new(pool.clone(), &config.cache);
    let audit = AuditLog::new(pool);
    let secret_service = SecretService::new(store, cipher, audit);

    start_api_server(&config.server, ApiState { secret_service }).await
}
