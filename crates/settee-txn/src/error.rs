use settee_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxnError {
    /// The bulk write for a collection failed; remaining batches were abandoned.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// `exit` was called more times than `enter`.
    #[error("scope exited without a matching enter")]
    ScopeUnderflow,
}

pub type TxnResult<T> = Result<T, TxnError>;
