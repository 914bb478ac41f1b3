use anyhow::Context;
use projectdesk_backend::auth::TokenVerifier;
use projectdesk_backend::config::{Config, LogFormat};
use projectdesk_backend::database::{self, PoolConfig};
use projectdesk_backend::invoicing::{InvoiceSync, ZohoBooksClient};
use projectdesk_backend::payments::providers::RazorpayProvider;
use projectdesk_backend::{api, AppState, Stores};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn build_invoicing(config: &Config) -> anyhow::Result<InvoiceSync> {
    let Some(zoho) = config.zoho.clone() else {
        tracing::info!("Zoho Books not configured; invoices stay local");
        return Ok(InvoiceSync::disabled());
    };

    #[allow(unused_mut)]
    let mut client = ZohoBooksClient::new(zoho).context("Failed to build Zoho Books client")?;

    #[cfg(feature = "cache")]
    if let Some(redis) = &config.redis {
        use projectdesk_backend::cache::{init_cache_pool, CacheConfig, RedisCache};

        match init_cache_pool(CacheConfig {
            redis_url: redis.url.clone(),
            ..Default::default()
        })
        .await
        {
            Ok(pool) => client = client.with_token_cache(RedisCache::new(pool)),
            Err(e) => tracing::warn!("Redis unavailable, Zoho tokens will not be cached: {}", e),
        }
    }

    tracing::info!("Zoho Books invoice sync enabled");
    Ok(InvoiceSync::new(Arc::new(client)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.server.log_format);

    tracing::info!("Starting ProjectDesk backend");
    tracing::info!("Environment: {}", config.server.environment);

    let pool = database::init_pool(
        &config.database.url,
        Some(PoolConfig {
            max_connections: config.database.max_connections,
            ..Default::default()
        }),
    )
    .await
    .context("Failed to connect to the database")?;

    if config.database.run_migrations {
        database::run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let gateway = RazorpayProvider::new(config.payments.razorpay.clone())
        .context("Failed to build Razorpay client")?;
    let invoicing = build_invoicing(&config).await?;

    let state = AppState {
        stores: Stores::postgres(pool.clone()),
        gateway: Arc::new(gateway),
        invoicing,
        tokens: Arc::new(TokenVerifier::new(
            &config.auth.jwt_secret,
            config.auth.jwt_audience.as_deref(),
        )),
        currency: config.payments.currency.clone(),
        environment: config.server.environment.clone(),
        pool: Some(pool),
    };

    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("HOST and PORT do not form a valid socket address")?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
