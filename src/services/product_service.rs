use async_trait::async_trait;
use sqlx::{
    pool::PoolConnection, postgres::PgConnectOptions, Connection, PgPool, Postgres,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use crate::config::{DbConfig, DEFAULT_ENV_FILE};
use crate::db::{self, PoolMetrics, PoolPolicy, PoolStats};
use crate::error::{DataError, ServiceInitError};
use crate::models::{Product, ProductRequest};
use crate::services::health::{self, HealthReport};

/// Upper bound on the connectivity probe in `health_check`.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

static INSTANCE: OnceCell<ProductService> = OnceCell::const_new();

/// Product persistence as seen by the HTTP layer.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, DataError>;

    /// Fails both when the id does not exist and when the backend errors.
    async fn get_product(&self, id: &str) -> Result<Product, DataError>;

    async fn create_product(&self, req: ProductRequest) -> Result<(), DataError>;

    /// Succeeds without effect when no row has this id.
    async fn update_product(&self, id: &str, req: ProductRequest) -> Result<(), DataError>;

    /// Succeeds without effect when no row has this id.
    async fn delete_product(&self, id: &str) -> Result<(), DataError>;

    /// Never fails; an unreachable backend is reported as `status: down`.
    async fn health_check(&self) -> HealthReport;
}

/// Postgres-backed product store.
#[derive(Debug, Clone)]
pub struct ProductService {
    pool: PgPool,
    metrics: Arc<PoolMetrics>,
    policy: PoolPolicy,
}

impl ProductService {
    /// Returns the process-wide service, reading `.env` on every call.
    pub async fn shared() -> Result<&'static ProductService, ServiceInitError> {
        Self::shared_from(DEFAULT_ENV_FILE).await
    }

    /// Returns the process-wide service.
    ///
    /// Configuration is always loaded, so a missing env file fails even when
    /// the service already exists. Only the first successful call opens a
    /// pool; later calls get that same instance whatever their config says.
    pub async fn shared_from(
        env_file: impl AsRef<Path>,
    ) -> Result<&'static ProductService, ServiceInitError> {
        let config = DbConfig::load_from(env_file)?;

        if let Some(service) = INSTANCE.get() {
            tracing::debug!("Reusing existing product service");
            return Ok(service);
        }

        let service = INSTANCE
            .get_or_try_init(|| async { Self::open(&config) })
            .await?;

        Ok(service)
    }

    /// Opens a standalone service with the default pool policy.
    pub fn open(config: &DbConfig) -> Result<Self, DataError> {
        Self::with_policy(config, PoolPolicy::default())
    }

    pub fn with_policy(config: &DbConfig, policy: PoolPolicy) -> Result<Self, DataError> {
        let metrics = Arc::new(PoolMetrics::new());
        let pool = db::open_pool(config, &policy, Arc::clone(&metrics))?;

        tracing::info!(
            host = %config.host,
            database = %config.database,
            schema = %config.schema,
            max_connections = policy.max_connections,
            "Database pool opened"
        );

        Ok(Self {
            pool,
            metrics,
            policy,
        })
    }

    /// Opens a standalone service from ready-made connect options.
    pub fn with_options(options: PgConnectOptions, policy: PoolPolicy) -> Self {
        let metrics = Arc::new(PoolMetrics::new());
        let pool = db::open_pool_with(options, &policy, Arc::clone(&metrics));

        Self {
            pool,
            metrics,
            policy,
        }
    }

    /// Wraps an existing pool. Idle and lifetime closes made by that pool's
    /// own settings are not counted.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            metrics: Arc::new(PoolMetrics::new()),
            policy: PoolPolicy::default(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        db::pool_stats(&self.pool, &self.metrics)
    }

    /// Closes the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    /// Checks out one connection for the duration of a single statement.
    /// Released on drop along every exit path.
    async fn acquire(&self) -> Result<PoolConnection<Postgres>, DataError> {
        let saturated =
            self.pool.num_idle() == 0 && self.pool.size() >= self.policy.max_connections;
        let started = Instant::now();

        let conn = self.pool.acquire().await?;

        if saturated {
            self.metrics.record_wait(started.elapsed());
        }

        Ok(conn)
    }

    async fn probe(&self) -> Result<(), DataError> {
        let mut conn = self.acquire().await?;
        conn.ping().await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for ProductService {
    async fn list_products(&self) -> Result<Vec<Product>, DataError> {
        let mut conn = self.acquire().await?;
        let products = Product::list(&mut conn).await?;
        Ok(products)
    }

    async fn get_product(&self, id: &str) -> Result<Product, DataError> {
        let mut conn = self.acquire().await?;
        let product = Product::find_by_id(&mut conn, id).await?;
        Ok(product)
    }

    async fn create_product(&self, req: ProductRequest) -> Result<(), DataError> {
        let mut conn = self.acquire().await?;
        Product::insert(&mut conn, &req).await?;

        tracing::info!(name = %req.name, price = req.price, "Created product");
        Ok(())
    }

    async fn update_product(&self, id: &str, req: ProductRequest) -> Result<(), DataError> {
        let mut conn = self.acquire().await?;
        let updated = Product::update(&mut conn, id, &req).await?;

        if updated == 0 {
            tracing::debug!(product_id = %id, "Update matched no product");
        }
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<(), DataError> {
        let mut conn = self.acquire().await?;
        let deleted = Product::delete(&mut conn, id).await?;

        if deleted == 0 {
            tracing::debug!(product_id = %id, "Delete matched no product");
        }
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        match tokio::time::timeout(HEALTH_PROBE_TIMEOUT, self.probe()).await {
            Ok(Ok(())) => health::diagnose(&self.stats()),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Database health probe failed");
                health::down(e)
            }
            Err(_) => {
                tracing::warn!("Database health probe timed out");
                health::down(format!(
                    "database ping timed out after {:?}",
                    HEALTH_PROBE_TIMEOUT
                ))
            }
        }
    }
}
