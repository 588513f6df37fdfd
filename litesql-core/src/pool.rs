use crate::{Driver, Result, TransactionContext};
use std::{
    collections::{HashMap, VecDeque},
    fmt::{self, Display, Formatter},
    ops::{Deref, DerefMut},
    sync::Arc,
};
use tokio::sync::Mutex;

/// Identity of a pool queue: the dialect and the connection string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub dialect: &'static str,
    pub connection_string: Arc<str>,
}

impl PoolKey {
    pub fn new(dialect: &'static str, connection_string: impl Into<Arc<str>>) -> Self {
        Self {
            dialect,
            connection_string: connection_string.into(),
        }
    }
}

impl Display for PoolKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.dialect, self.connection_string)
    }
}

/// Connection handed out by [`ConnectionPool::borrow`].
pub enum Lease<'t, C> {
    /// Pinned by an open transaction, stays with it when given back.
    Bound(&'t mut C),
    /// Taken from the idle queue or freshly opened.
    Pooled(C),
}

impl<C> Deref for Lease<'_, C> {
    type Target = C;
    fn deref(&self) -> &C {
        match self {
            Lease::Bound(v) => v,
            Lease::Pooled(v) => v,
        }
    }
}

impl<C> DerefMut for Lease<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        match self {
            Lease::Bound(v) => v,
            Lease::Pooled(v) => v,
        }
    }
}

/// FIFO queues of idle connections, one per [`PoolKey`].
///
/// There is no upper bound: every miss opens a connection and every give back keeps
/// it. The lock is held only while a queue is read or written, never while a
/// connection is opened.
pub struct ConnectionPool<D: Driver> {
    driver: D,
    idle: Mutex<HashMap<PoolKey, VecDeque<D::Connection>>>,
}

impl<D: Driver> ConnectionPool<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            idle: Default::default(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// An idle connection for `key`, or a new one.
    pub async fn acquire(&self, key: &PoolKey) -> Result<D::Connection> {
        let idle = self
            .idle
            .lock()
            .await
            .get_mut(key)
            .and_then(VecDeque::pop_front);
        if let Some(connection) = idle {
            log::trace!("Reusing an idle connection of {}", key);
            return Ok(connection);
        }
        log::trace!("Opening a new connection for {}", key);
        self.driver.connect(&key.connection_string).await
    }

    /// The connection pinned by `transaction` when it is open, otherwise
    /// [`ConnectionPool::acquire`].
    pub async fn borrow<'t>(
        &self,
        key: &PoolKey,
        transaction: Option<&'t mut TransactionContext<D::Connection>>,
    ) -> Result<Lease<'t, D::Connection>> {
        if let Some(transaction) = transaction.filter(|v| v.is_open()) {
            log::trace!("Using the connection bound to the open transaction");
            return Ok(Lease::Bound(transaction.connection()));
        }
        Ok(Lease::Pooled(self.acquire(key).await?))
    }

    /// Return a borrowed connection. Bound ones stay with their transaction.
    pub async fn give_back(&self, key: &PoolKey, lease: Lease<'_, D::Connection>) {
        match lease {
            Lease::Bound(..) => log::trace!("Connection stays bound to its transaction"),
            Lease::Pooled(connection) => self.release(key, connection).await,
        }
    }

    /// Put `connection` at the back of the idle queue of `key`.
    pub async fn release(&self, key: &PoolKey, connection: D::Connection) {
        log::trace!("Returning a connection to {}", key);
        self.idle
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .push_back(connection);
    }

    pub async fn idle_count(&self, key: &PoolKey) -> usize {
        self.idle.lock().await.get(key).map_or(0, VecDeque::len)
    }
}
