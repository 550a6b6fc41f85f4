//! Database Test Utilities
//!
//! Provides a PostgreSQL testcontainer with the ledger migrations applied,
//! and a unit-of-work provider over it for the PostgreSQL suites.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use core_kernel::FixedClock;
use domain_ledger::{CustomerService, InvoiceService, TruckLoadService};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PgUnitOfWorkProvider};

use crate::fixtures::TemporalFixtures;

/// Default PostgreSQL image for testing
const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "poultry_pos_test";

/// Tables in reverse dependency order
const LEDGER_TABLES: [&str; 5] = ["payments", "invoices", "truck_loads", "customers", "trucks"];

/// Where the container's database is reachable
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A throwaway PostgreSQL 16 container holding the ledger schema
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container and applies the ledger migrations
    ///
    /// The seed migration leaves trucks `T001` and `T002` and the cash
    /// customer in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or a migration fails
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let port = container.get_host_port_ipv4(5432).await?;
        let host = container.get_host().await?.to_string();

        let config = TestDatabaseConfig {
            host,
            port,
            ..TestDatabaseConfig::default()
        };

        let pool = create_pool(
            DatabaseConfig::new(config.connection_url())
                .max_connections(5)
                .min_connections(1)
                .acquire_timeout(Duration::from_secs(30)),
        )
        .await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    /// A unit-of-work provider over this database
    pub fn provider(&self) -> Arc<PgUnitOfWorkProvider> {
        Arc::new(PgUnitOfWorkProvider::new(self.pool.clone()))
    }

    /// The three services over this database with the clock on the business date
    pub fn services(&self) -> PgServices {
        let provider = self.provider();
        let clock = TemporalFixtures::fixed_clock();
        PgServices {
            invoices: InvoiceService::new(provider.clone(), clock.clone()),
            customers: CustomerService::new(provider.clone(), clock.clone()),
            trucks: TruckLoadService::new(provider.clone(), clock.clone()),
            provider,
            clock,
        }
    }

    /// Removes every ledger row, seed rows included, keeping the schema
    pub async fn clear_data(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for table in LEDGER_TABLES {
            sqlx::query(&format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

/// Services wired to a [`TestDatabase`]
pub struct PgServices {
    pub provider: Arc<PgUnitOfWorkProvider>,
    pub clock: Arc<FixedClock>,
    pub invoices: InvoiceService,
    pub customers: CustomerService,
    pub trucks: TruckLoadService,
}

/// Starts a fresh container for one test
pub async fn create_isolated_test_database() -> Result<TestDatabase, Box<dyn std::error::Error + Send + Sync>> {
    TestDatabase::new().await
}

/// Declares a Docker-backed test that receives its own [`TestDatabase`]
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$db:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "requires Docker"]
        async fn $name() {
            let $db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let config = TestDatabaseConfig::default();
        let url = config.connection_url();

        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.ends_with("/poultry_pos_test"));
    }

    #[test]
    fn test_children_are_cleared_before_parents() {
        let position = |table: &str| LEDGER_TABLES.iter().position(|t| *t == table).unwrap();
        assert!(position("payments") < position("invoices"));
        assert!(position("invoices") < position("customers"));
        assert!(position("truck_loads") < position("trucks"));
    }
}
