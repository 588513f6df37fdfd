use crate::{
    ConnectionPool, Dialect, DialectRegistry, Driver, Error, ParameterBinding, PoolKey, Result,
    Session, StatementObserver,
};
use std::sync::Arc;

/// Settings of a [`LiteSqlClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Handed to [`Driver::connect`] as is.
    pub connection_string: String,
    /// Registry name of the dialect.
    pub dialect: String,
    /// Whether primary keys are generated by the database, unless the entity or the
    /// column says otherwise.
    pub auto_increment: bool,
    /// Maximum number of rows per insert statement.
    pub batch_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            dialect: "sqlite".into(),
            auto_increment: false,
            batch_size: 500,
        }
    }
}

impl ClientConfig {
    pub fn new(dialect: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            dialect: dialect.into(),
            ..Default::default()
        }
    }

    /// Configuration for a `dialect://...` url, the scheme names the dialect.
    pub fn from_url(url: &str) -> Result<Self> {
        let Some((dialect, _)) = url.split_once("://").filter(|(v, _)| !v.is_empty()) else {
            return Err(Error::msg(format!(
                "Connection url `{}` must start with the dialect name, like `sqlite://`",
                url
            )));
        };
        Ok(Self::new(dialect, url))
    }

    pub fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Session factory: configuration, dialect and connection pool.
///
/// The dialect is resolved once, when the client is created.
pub struct LiteSqlClient<D: Driver> {
    config: ClientConfig,
    dialect: Arc<dyn Dialect>,
    pool: Arc<ConnectionPool<D>>,
    key: PoolKey,
    observer: Option<StatementObserver>,
}

impl<D: Driver> LiteSqlClient<D> {
    pub fn new(config: ClientConfig, registry: &DialectRegistry, driver: D) -> Result<Self> {
        Self::with_pool(config, registry, Arc::new(ConnectionPool::new(driver)))
    }

    /// Client sharing `pool` with other clients.
    pub fn with_pool(
        config: ClientConfig,
        registry: &DialectRegistry,
        pool: Arc<ConnectionPool<D>>,
    ) -> Result<Self> {
        let dialect = registry.get(&config.dialect)?;
        if config.batch_size == 0 {
            return Err(Error::msg("The batch size must be at least 1"));
        }
        let key = PoolKey::new(dialect.name(), config.connection_string.as_str());
        log::debug!("Client created for {}", key);
        Ok(Self {
            config,
            dialect,
            pool,
            key,
            observer: None,
        })
    }

    /// Call `observer` before every statement of the sessions created from now on.
    pub fn on_executing(
        &mut self,
        observer: impl Fn(&str, &[ParameterBinding]) + Send + Sync + 'static,
    ) -> &mut Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn session(&self) -> Session<D> {
        Session::new(
            self.dialect.clone(),
            self.pool.clone(),
            self.key.clone(),
            self.config.batch_size,
            self.config.auto_increment,
            self.observer.clone(),
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn pool(&self) -> &Arc<ConnectionPool<D>> {
        &self.pool
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Connection, LiteSqlError, RowSet};

    struct Offline;

    struct Never;

    impl Connection for Never {
        async fn execute(&mut self, _: &str, _: &[ParameterBinding]) -> Result<RowSet> {
            Ok(RowSet::default())
        }
        async fn begin(&mut self) -> Result<()> {
            Ok(())
        }
        async fn commit(&mut self) -> Result<()> {
            Ok(())
        }
        async fn rollback(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl Driver for Offline {
        type Connection = Never;
        async fn connect(&self, connection_string: &str) -> Result<Never> {
            Err(Error::msg(format!("Cannot reach {}", connection_string)))
        }
    }

    #[test]
    fn config_from_url() {
        let config = ClientConfig::from_url("postgresql://user@localhost/db")
            .unwrap()
            .with_batch_size(100);
        assert_eq!(config.dialect, "postgresql");
        assert_eq!(config.connection_string, "postgresql://user@localhost/db");
        assert_eq!(config.batch_size, 100);
        assert!(!config.auto_increment);
        assert!(ClientConfig::from_url("localhost/db").is_err());
        assert!(ClientConfig::from_url("://x").is_err());
    }

    #[test]
    fn dialect_is_resolved_once() {
        let registry = DialectRegistry::new();
        let client =
            LiteSqlClient::new(ClientConfig::from_url("oracle://db").unwrap(), &registry, Offline)
                .unwrap();
        assert_eq!(client.dialect().name(), "oracle");
        assert_eq!(client.key().to_string(), "oracle_oracle://db");
        let error = LiteSqlClient::new(ClientConfig::new("db2", "x"), &registry, Offline)
            .err()
            .unwrap();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_provider_unregistered());
        let zero = ClientConfig::new("sqlite", "x").with_batch_size(0);
        assert!(LiteSqlClient::new(zero, &registry, Offline).is_err());
    }

    #[tokio::test]
    async fn connect_errors_propagate() {
        let client = LiteSqlClient::new(
            ClientConfig::new("sqlite", "file.db"),
            &DialectRegistry::new(),
            Offline,
        )
        .unwrap();
        let mut session = client.session();
        let error = session.execute(session.builder()).await.unwrap_err();
        assert_eq!(error.to_string(), "Cannot reach file.db");
    }
}
