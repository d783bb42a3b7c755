use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetteeError {
    #[error("store error: {0}")]
    Store(#[from] settee_store::StoreError),

    #[error("transaction error: {0}")]
    Txn(#[from] settee_txn::TxnError),

    #[error("bulk error: {0}")]
    Bulk(#[from] settee_bulk::BulkError),

    #[error("cache error: {0}")]
    Cache(#[from] settee_cache::CacheError),
}

pub type SetteeResult<T> = Result<T, SetteeError>;
