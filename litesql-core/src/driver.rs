use crate::{Dialect, ParameterBinding, Result, RowSet, SqlFragment};
use std::future::Future;

/// Factory of physical connections, the opaque capability a backend provides.
pub trait Driver: Send + Sync + 'static {
    type Connection: Connection;

    /// Open a connection. Failures propagate unmodified to the caller.
    fn connect(
        &self,
        connection_string: &str,
    ) -> impl Future<Output = Result<Self::Connection>> + Send;
}

/// One physical connection.
///
/// Statement text already uses the parameter markers of the dialect it was built for.
pub trait Connection: Send + 'static {
    /// Run a statement and return its rows, or the affected count for modifying ones.
    fn execute(
        &mut self,
        sql: &str,
        params: &[ParameterBinding],
    ) -> impl Future<Output = Result<RowSet>> + Send;

    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send;
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Something statements can be sent to, the session in practice.
pub trait Executor: Send {
    fn dialect(&self) -> &dyn Dialect;

    /// General method to send any statement.
    fn run(
        &mut self,
        sql: String,
        params: Vec<ParameterBinding>,
    ) -> impl Future<Output = Result<RowSet>> + Send;

    /// Render the fragment for this dialect and run it.
    fn run_fragment(&mut self, fragment: SqlFragment) -> impl Future<Output = Result<RowSet>> + Send {
        let sql = fragment.render(self.dialect());
        self.run(sql, fragment.into_params())
    }
}
