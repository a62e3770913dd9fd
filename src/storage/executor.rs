//! The statement execution boundary.
//!
//! The batcher never talks to a database directly. It hands finished
//! statements to an [`Executor`], which owns the wire protocol, the
//! transaction context and error reporting.

use crate::value::Value;

/// Executes one statement, optionally with bound parameters.
///
/// Deletes are emitted with an empty `params` slice (values are embedded as
/// literals); inserts pass one flat parameter list covering every row.
pub trait Executor {
    /// Error surfaced by the backing store.
    type Error;

    /// Execute `sql` with `params` bound to its placeholders.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), Self::Error>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    type Error = E::Error;

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), Self::Error> {
        (**self).execute(sql, params)
    }
}
