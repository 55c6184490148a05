use crate::config::AppConfig;
use crate::errors::{AppError, ServiceError};
use futures::future::BoxFuture;
use metrics::{counter, gauge, histogram};
use migrations::Migrator;
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database
///
/// # Errors
/// Returns an `AppError` if the connection cannot be established
pub async fn establish_connection(database_url: &str) -> Result<DbPool, AppError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, AppError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("katha_db.max_connections", config.max_connections as f64);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Database connection pool established successfully");

    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, AppError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Database access wrapper with built-in metrics and error handling
#[derive(Debug, Clone)]
pub struct DatabaseAccess {
    pool: Arc<DbPool>,
}

impl DatabaseAccess {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Runs `f` inside one transaction: committed when it returns `Ok`,
    /// rolled back otherwise.
    pub async fn transaction<F, T, E>(&self, operation: &str, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, E>> + Send,
        T: Send,
        E: From<DbErr> + std::error::Error + Send,
    {
        let start = Instant::now();
        debug!(operation = %operation, "Starting database transaction");
        counter!("katha_db.transaction.started", 1);

        let txn = self.pool.begin().await?;
        let result = f(&txn).await;

        let outcome = match result {
            Ok(value) => txn.commit().await.map(|_| value).map_err(E::from),
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(operation = %operation, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        };

        let elapsed = start.elapsed();
        histogram!("katha_db.transaction.duration", elapsed);

        match &outcome {
            Ok(_) => {
                counter!("katha_db.transaction.committed", 1);
                debug!(operation = %operation, "Transaction committed in {:?}", elapsed);
            }
            Err(e) => {
                counter!("katha_db.transaction.rolled_back", 1);
                warn!(operation = %operation, error = %e, "Transaction rolled back after {:?}", elapsed);
            }
        }

        outcome
    }

    /// Execute a single query with metrics and logging
    pub async fn execute<F, T>(&self, operation: &str, f: F) -> Result<T, ServiceError>
    where
        F: for<'a> FnOnce(&'a DbPool) -> BoxFuture<'a, Result<T, DbErr>> + Send,
        T: Send,
    {
        let start = Instant::now();

        let result = f(&self.pool).await.map_err(|e| {
            error!(operation = %operation, error = %e, "Database operation failed");
            counter!("katha_db.operation.error", 1, "operation" => operation.to_string());
            ServiceError::DatabaseError(e)
        });

        let elapsed = start.elapsed();
        histogram!("katha_db.operation.duration", elapsed, "operation" => operation.to_string());
        debug!(operation = %operation, duration = ?elapsed, "Database operation finished");

        result
    }
}

/// Runs database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    info!("Running database migrations");
    let start = Instant::now();

    let result = Migrator::up(pool, None)
        .await
        .map_err(|e| ServiceError::MigrationError(e.to_string()));

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!(
            "Database migrations completed successfully in {:?}",
            elapsed
        ),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<Duration, AppError> {
    let start = Instant::now();
    match pool.ping().await {
        Ok(()) => {
            let elapsed = start.elapsed();
            debug!("Database connection check successful in {:?}", elapsed);
            gauge!("katha_db.connection_latency", elapsed.as_millis() as f64);
            Ok(elapsed)
        }
        Err(e) => {
            error!("Database connection check failed: {}", e);
            counter!("katha_db.connection_failures", 1);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, DbBackend, Statement};

    async fn memory_pool() -> DbPool {
        let config = DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        };
        establish_connection_with_config(&config).await.unwrap()
    }

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();

        for table in [
            "tbl_groups",
            "tbl_categories",
            "tbl_items",
            "tbl_purchases",
            "tbl_purchase_items",
            "tbl_cashsales",
            "tbl_cashsale_items",
            "cities",
            "teachers",
        ] {
            let row = pool
                .query_one(Statement::from_sql_and_values(
                    DbBackend::Sqlite,
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table.into()],
                ))
                .await
                .unwrap();
            assert!(row.is_some(), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn migrations_run_on_a_file_backed_pool() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("katha.db").display()),
            max_connections: 5,
            ..Default::default()
        };
        let pool = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let row = pool
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'tbl_cashsale_items'",
            ))
            .await
            .unwrap()
            .expect("line table exists");
        let sql: String = row.try_get("", "sql").unwrap();
        assert!(sql.contains("fk_cashsale_items_sale_id"));

        let leftover = pool
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE name = 'tbl_cashsale_items_new'",
            ))
            .await
            .unwrap();
        assert!(leftover.is_none());
    }

    #[tokio::test]
    async fn cashsale_item_columns_are_rebuilt_in_order() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();

        let rows = pool
            .query_all(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT name FROM pragma_table_info('tbl_cashsale_items') ORDER BY cid",
            ))
            .await
            .unwrap();
        let columns: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String>("", "name").unwrap())
            .collect();
        assert_eq!(
            columns,
            vec!["id", "sale_id", "item_id", "item_code", "item_name", "quantity", "rate", "amount"]
        );
    }

    #[tokio::test]
    async fn failed_transaction_rolls_back() {
        let pool = memory_pool().await;
        pool.execute_unprepared("CREATE TABLE t (v INTEGER)")
            .await
            .unwrap();
        let access = DatabaseAccess::new(Arc::new(pool));

        let result: Result<(), ServiceError> = access
            .transaction("insert_then_fail", |txn| {
                Box::pin(async move {
                    txn.execute_unprepared("INSERT INTO t (v) VALUES (1)").await?;
                    Err(ServiceError::InvalidInput("abort".into()))
                })
            })
            .await;
        assert!(result.is_err());

        let count = access
            .pool()
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM t",
            ))
            .await
            .unwrap()
            .unwrap()
            .try_get::<i64>("", "n")
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn connection_check_reports_latency() {
        let pool = memory_pool().await;
        assert!(check_connection(&pool).await.is_ok());
    }
}
