/// The connection a session pinned for its open transaction.
#[derive(Debug)]
pub struct TransactionContext<C> {
    pub(crate) connection: C,
    open: bool,
}

impl<C> TransactionContext<C> {
    /// Bind `connection`, on which the transaction was already started.
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn connection(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Close the transaction and unpin the connection.
    pub fn finish(mut self) -> C {
        self.open = false;
        self.connection
    }
}
