use crate::{
    AsValue, Connection, ConnectionPool, Context, Dialect, Driver, Entity, Executor, IntoArgs,
    LiteSqlError, ParameterBinding, PoolKey, QueryBuilder, Result, Row, RowSet, RowsAffected,
    SqlFragment, TransactionContext, Value, require_primary_key, truncate_long,
    writer::{write_delete_by_id, write_insert, write_update},
};
use std::{collections::HashMap, future::Future, sync::Arc};

/// Callback invoked with the text and the parameters of every statement right before
/// it is dispatched.
pub type StatementObserver = Arc<dyn Fn(&str, &[ParameterBinding]) + Send + Sync>;

/// Unit of work over pooled connections.
///
/// Each statement borrows a connection from the pool and gives it back once done,
/// unless a transaction is open: then every statement runs on the connection pinned
/// by the transaction until it is committed or rolled back. A session runs one
/// statement at a time, open more sessions for parallel work.
pub struct Session<D: Driver> {
    dialect: Arc<dyn Dialect>,
    pool: Arc<ConnectionPool<D>>,
    key: PoolKey,
    batch_size: usize,
    auto_increment: bool,
    observer: Option<StatementObserver>,
    transaction: Option<TransactionContext<D::Connection>>,
    snapshots: HashMap<(&'static str, String), Row>,
}

impl<D: Driver> Session<D> {
    pub(crate) fn new(
        dialect: Arc<dyn Dialect>,
        pool: Arc<ConnectionPool<D>>,
        key: PoolKey,
        batch_size: usize,
        auto_increment: bool,
        observer: Option<StatementObserver>,
    ) -> Self {
        Self {
            dialect,
            pool,
            key,
            batch_size,
            auto_increment,
            observer,
            transaction: None,
            snapshots: HashMap::new(),
        }
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.as_ref().is_some_and(TransactionContext::is_open)
    }

    /// Empty builder for this dialect.
    pub fn builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.dialect.clone())
    }

    /// Builder starting with `template`.
    pub fn sql(&self, template: &str, args: impl IntoArgs) -> Result<QueryBuilder> {
        let mut result = self.builder();
        result.append(template, args)?;
        Ok(result)
    }

    /// `SELECT` of every column of `E` aliased `t`, ready for filters.
    pub fn select<E: Entity>(&self) -> QueryBuilder<E> {
        self.select_as("t")
    }

    pub fn select_as<E: Entity>(&self, alias: &str) -> QueryBuilder<E> {
        let mut result = QueryBuilder::for_entity(self.dialect.clone());
        result.select(alias.to_owned());
        result
    }

    /// Filter clause for [`QueryBuilder::delete`].
    pub fn condition<E: Entity>(&self) -> QueryBuilder<E> {
        QueryBuilder::condition(self.dialect.clone())
    }

    pub async fn insert<E: Entity>(&mut self, entity: &E) -> Result<RowsAffected> {
        let statement = write_insert(self.dialect.as_ref(), [entity], self.auto_increment);
        Ok(self.run_fragment(statement).await?.rows_affected())
    }

    /// Insert in statements of at most the configured batch size, one after the other
    /// in input order.
    pub async fn insert_many<'a, E: Entity + 'a>(
        &mut self,
        entities: impl IntoIterator<Item = &'a E>,
    ) -> Result<RowsAffected> {
        let entities = entities.into_iter().collect::<Vec<_>>();
        let mut result = RowsAffected::default();
        for chunk in entities.chunks(self.batch_size.max(1)) {
            let statement = write_insert(
                self.dialect.as_ref(),
                chunk.iter().copied(),
                self.auto_increment,
            );
            let affected = self.run_fragment(statement).await?.rows_affected();
            result.rows_affected += affected.rows_affected;
            result.last_affected_id = affected.last_affected_id.or(result.last_affected_id);
        }
        Ok(result)
    }

    fn snapshot_key<E: Entity>(id: &Value) -> (&'static str, String) {
        let id = match id.as_integer() {
            Some(v) => v.to_string(),
            None => format!("{:?}", id),
        };
        (E::table_name(), id)
    }

    /// Remember the current values of `entity`, the next [`Session::update`] of the
    /// same row writes only what changed since.
    pub fn attach_old<E: Entity>(&mut self, entity: &E) {
        let key = Self::snapshot_key::<E>(&entity.primary_key().unwrap_or_default());
        self.snapshots.insert(key, entity.row());
    }

    /// Write the non key columns of `entity`, only the changed ones when a snapshot
    /// was attached. Nothing is sent when nothing changed.
    pub async fn update<E: Entity>(&mut self, entity: &E) -> Result<RowsAffected> {
        require_primary_key::<E>()?;
        let key = Self::snapshot_key::<E>(&entity.primary_key().unwrap_or_default());
        let row = entity.row();
        let changed = E::columns()
            .iter()
            .enumerate()
            .filter(|(i, c)| {
                !c.primary_key
                    && self
                        .snapshots
                        .get(&key)
                        .is_none_or(|old| old.get(*i) != row.get(*i))
            })
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if changed.is_empty() {
            log::debug!("Update of `{}` skipped, nothing changed", E::table_name());
            return Ok(RowsAffected::default());
        }
        let statement = write_update(self.dialect.as_ref(), entity, &changed)?;
        let result = self.run_fragment(statement).await?.rows_affected();
        if let Some(snapshot) = self.snapshots.get_mut(&key) {
            *snapshot = row;
        }
        Ok(result)
    }

    pub async fn delete<E: Entity>(&mut self, entity: &E) -> Result<RowsAffected> {
        require_primary_key::<E>()?;
        let id = entity.primary_key().unwrap_or_default();
        self.delete_key::<E>(id).await
    }

    pub async fn delete_by_id<E: Entity>(&mut self, id: impl AsValue) -> Result<RowsAffected> {
        self.delete_key::<E>(id.as_value()).await
    }

    async fn delete_key<E: Entity>(&mut self, id: Value) -> Result<RowsAffected> {
        let statement = write_delete_by_id::<E>(self.dialect.as_ref(), id.clone())?;
        let result = self.run_fragment(statement).await?.rows_affected();
        self.snapshots.remove(&Self::snapshot_key::<E>(&id));
        Ok(result)
    }

    pub async fn find_by_id<E: Entity>(&mut self, id: impl AsValue) -> Result<Option<E>> {
        let key = require_primary_key::<E>()?;
        let mut query = self.select::<E>();
        query.filter(key.column_ref.eq(id.as_value()))?;
        query.fetch_one(self).await
    }

    /// `MAX(key) + 1`, or 1 for an empty table.
    pub async fn query_next_id<E: Entity>(&mut self) -> Result<i64> {
        let key = require_primary_key::<E>()?;
        let sql = self.dialect.max_id_sql(E::table_name(), key.name());
        let value = self.run(sql, Vec::new()).await?.scalar().unwrap_or_default();
        let max = Option::<i64>::try_from_value(value)
            .with_context(|| format!("Unexpected maximum of `{}`", key.name()))?;
        Ok(max.map_or(1, |v| v + 1))
    }

    pub async fn query_list<E: Entity>(&mut self, statement: impl Into<SqlFragment>) -> Result<Vec<E>> {
        self.run_fragment(statement.into())
            .await?
            .into_labeled()
            .map(E::from_row)
            .collect()
    }

    pub async fn query_one<E: Entity>(&mut self, statement: impl Into<SqlFragment>) -> Result<Option<E>> {
        self.run_fragment(statement.into())
            .await?
            .into_labeled()
            .next()
            .map(E::from_row)
            .transpose()
    }

    pub async fn query_scalar<T: AsValue>(&mut self, statement: impl Into<SqlFragment>) -> Result<T> {
        let value = self
            .run_fragment(statement.into())
            .await?
            .scalar()
            .unwrap_or_default();
        T::try_from_value(value)
    }

    pub async fn execute(&mut self, statement: impl Into<SqlFragment>) -> Result<RowsAffected> {
        Ok(self.run_fragment(statement.into()).await?.rows_affected())
    }

    /// Pin a connection and start a transaction on it. Transactions don't nest.
    pub async fn begin_transaction(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(LiteSqlError::TransactionState("a transaction is already open").into());
        }
        let mut connection = self.pool.acquire(&self.key).await?;
        connection
            .begin()
            .await
            .context("Could not begin the transaction")?;
        log::debug!("Transaction started on {}", self.key);
        self.transaction = Some(TransactionContext::new(connection));
        Ok(())
    }

    pub async fn commit_transaction(&mut self) -> Result<()> {
        let Some(mut transaction) = self.transaction.take() else {
            return Err(LiteSqlError::TransactionState("there is no open transaction to commit").into());
        };
        if let Err(e) = transaction.connection().commit().await {
            log::error!("Commit failed, the connection is discarded: {:#}", e);
            return Err(e);
        }
        self.pool.release(&self.key, transaction.finish()).await;
        Ok(())
    }

    pub async fn rollback_transaction(&mut self) -> Result<()> {
        let Some(mut transaction) = self.transaction.take() else {
            return Err(
                LiteSqlError::TransactionState("there is no open transaction to roll back").into(),
            );
        };
        if let Err(e) = transaction.connection().rollback().await {
            log::error!("Rollback failed, the connection is discarded: {:#}", e);
            return Err(e);
        }
        self.pool.release(&self.key, transaction.finish()).await;
        Ok(())
    }
}

impl<D: Driver> Executor for Session<D> {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn run(
        &mut self,
        sql: String,
        params: Vec<ParameterBinding>,
    ) -> impl Future<Output = Result<RowSet>> + Send {
        async move {
            log::debug!("{}", truncate_long!(sql));
            if let Some(observer) = &self.observer {
                observer(sql.as_str(), params.as_slice());
            }
            let mut connection = self
                .pool
                .borrow(&self.key, self.transaction.as_mut())
                .await?;
            let result = connection
                .execute(&sql, &params)
                .await
                .with_context(|| format!("While executing `{}`", truncate_long!(sql)));
            self.pool.give_back(&self.key, connection).await;
            result
        }
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if self.in_transaction() {
            log::warn!(
                "Session on {} dropped with an open transaction, its connection is discarded without rollback",
                self.key
            );
        }
    }
}
