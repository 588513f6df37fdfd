use litesql::{Connection, Driver, Error, ParameterBinding, Result, RowSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Scripted answer to a statement, `None` lets the next responder (or the default) decide.
pub type Responder = Arc<dyn Fn(&str, &[ParameterBinding]) -> Option<Result<RowSet>> + Send + Sync>;

/// A statement as received by a [`MemoryConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Sequence number of the connection, starting at 1.
    pub connection: usize,
    pub sql: String,
    pub params: Vec<ParameterBinding>,
}

impl Statement {
    pub fn is_write(&self) -> bool {
        ["INSERT", "UPDATE", "DELETE"]
            .iter()
            .any(|v| self.sql.trim_start().starts_with(v))
    }
}

#[derive(Default)]
struct State {
    opened: usize,
    statements: Vec<Statement>,
    committed: Vec<Statement>,
    events: Vec<String>,
    responders: Vec<Responder>,
    fail_connect: Option<String>,
    fail_statements: Vec<String>,
    fail_commit: bool,
}

/// Driver recording every statement instead of talking to a database.
///
/// Writes issued outside a transaction are committed immediately, inside one they
/// become visible in [`MemoryDriver::committed`] only on commit and are discarded on
/// rollback. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<State>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Default::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Add a responder, consulted in registration order.
    pub fn respond(
        &self,
        responder: impl Fn(&str, &[ParameterBinding]) -> Option<Result<RowSet>> + Send + Sync + 'static,
    ) -> &Self {
        self.state().responders.push(Arc::new(responder));
        self
    }

    /// Answer statements containing `fragment` with `rows`.
    pub fn respond_to(&self, fragment: &str, rows: RowSet) -> &Self {
        let fragment = fragment.to_owned();
        self.respond(move |sql, _| sql.contains(&fragment).then(|| Ok(rows.clone())))
    }

    /// Fail every statement containing `fragment`.
    pub fn fail_statements(&self, fragment: &str) -> &Self {
        self.state().fail_statements.push(fragment.to_owned());
        self
    }

    pub fn fail_connect(&self, message: &str) -> &Self {
        self.state().fail_connect = Some(message.to_owned());
        self
    }

    pub fn fail_commit(&self, fail: bool) -> &Self {
        self.state().fail_commit = fail;
        self
    }

    /// Every statement received, failed ones included.
    pub fn statements(&self) -> Vec<Statement> {
        self.state().statements.clone()
    }

    /// Writes that are visible outside their transaction.
    pub fn committed(&self) -> Vec<Statement> {
        self.state().committed.clone()
    }

    /// `BEGIN`, `COMMIT` and `ROLLBACK` with the connection number, like `BEGIN 1`.
    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn connections_opened(&self) -> usize {
        self.state().opened
    }

    /// Forget the recorded statements and events.
    pub fn clear(&self) {
        let mut state = self.state();
        state.statements.clear();
        state.committed.clear();
        state.events.clear();
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;

    async fn connect(&self, connection_string: &str) -> Result<MemoryConnection> {
        let mut state = self.state();
        if let Some(message) = &state.fail_connect {
            return Err(Error::msg(format!("{} ({})", message, connection_string)));
        }
        state.opened += 1;
        log::trace!("Memory connection {} opened", state.opened);
        Ok(MemoryConnection {
            id: state.opened,
            state: self.state.clone(),
            pending: None,
        })
    }
}

/// Connection of a [`MemoryDriver`].
pub struct MemoryConnection {
    id: usize,
    state: Arc<Mutex<State>>,
    pending: Option<Vec<Statement>>,
}

impl MemoryConnection {
    pub fn id(&self) -> usize {
        self.id
    }

    fn run(&mut self, sql: &str, params: &[ParameterBinding]) -> Result<RowSet> {
        let statement = Statement {
            connection: self.id,
            sql: sql.to_owned(),
            params: params.to_vec(),
        };
        let mut state = lock(&self.state);
        state.statements.push(statement.clone());
        if let Some(fragment) = state.fail_statements.iter().find(|v| sql.contains(v.as_str())) {
            return Err(Error::msg(format!("Statement rejected, it contains `{}`", fragment)));
        }
        let response = state.responders.iter().find_map(|v| v(sql, params));
        let written = statement.is_write();
        if written {
            match &mut self.pending {
                Some(pending) => pending.push(statement),
                None => state.committed.push(statement),
            }
        }
        match response {
            Some(response) => response,
            None if written => Ok(RowSet::affected(sql.matches("), (").count() as u64 + 1)),
            None => Ok(RowSet::default()),
        }
    }

    fn event(&self, name: &str) {
        lock(&self.state).events.push(format!("{} {}", name, self.id));
    }
}

impl Connection for MemoryConnection {
    async fn execute(&mut self, sql: &str, params: &[ParameterBinding]) -> Result<RowSet> {
        self.run(sql, params)
    }

    async fn begin(&mut self) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::msg("The connection already has an open transaction"));
        }
        self.pending = Some(Vec::new());
        self.event("BEGIN");
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Err(Error::msg("No transaction to commit"));
        };
        let mut state = lock(&self.state);
        if state.fail_commit {
            return Err(Error::msg("Commit rejected"));
        }
        state.committed.extend(pending);
        state.events.push(format!("COMMIT {}", self.id));
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.pending.take().is_none() {
            return Err(Error::msg("No transaction to roll back"));
        }
        self.event("ROLLBACK");
        Ok(())
    }
}
