use crate::{Dialect, LiteSqlError, MySql, Oracle, Postgres, Result, Sqlite};
use std::{collections::HashMap, sync::Arc};

/// Dialects known to a client factory, looked up by [`Dialect::name`].
///
/// Built once at startup and handed to [`crate::LiteSqlClient::new`].
#[derive(Clone)]
pub struct DialectRegistry {
    dialects: HashMap<&'static str, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// Registry without any dialect.
    pub fn empty() -> Self {
        Self {
            dialects: HashMap::new(),
        }
    }

    /// Registry with the dialects shipped by the crate.
    pub fn new() -> Self {
        let mut result = Self::empty();
        result
            .register(Sqlite)
            .register(MySql)
            .register(Postgres)
            .register(Oracle);
        result
    }

    /// Add or replace the dialect registered under the same name.
    pub fn register(&mut self, dialect: impl Dialect + 'static) -> &mut Self {
        let dialect: Arc<dyn Dialect> = Arc::new(dialect);
        if self.dialects.insert(dialect.name(), dialect).is_some() {
            log::debug!("Dialect registration replaced a previous one");
        }
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.dialects
            .get(name)
            .cloned()
            .ok_or_else(|| LiteSqlError::ProviderUnregistered(name.to_owned()).into())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.dialects.keys().copied()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        let registry = DialectRegistry::new();
        assert_eq!(registry.get("oracle").unwrap().name(), "oracle");
        let error = DialectRegistry::empty().get("sqlite").err().unwrap();
        assert!(
            error
                .downcast_ref::<LiteSqlError>()
                .is_some_and(LiteSqlError::is_provider_unregistered)
        );
    }
}
