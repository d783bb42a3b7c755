use serde::{Deserialize, Serialize};
use settee_types::DocId;

/// Durability requirement for a bulk write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Every document succeeds or the whole batch is rejected.
    AllOrNothing,
    /// Each document succeeds or fails on its own.
    #[default]
    NonAtomic,
}

/// Per-request write parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Number of replicas that must acknowledge the write (`w`).
    pub quorum: Option<u32>,
}

/// Per-request read parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Number of replicas that must agree on the read (`r`).
    pub quorum: Option<u32>,
}

/// Outcome of writing one document within a bulk request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub id: DocId,
    /// New revision on success.
    pub rev: Option<String>,
    /// Failure reason, e.g. `"conflict"`.
    pub error: Option<String>,
}

impl WriteResult {
    pub fn ok(id: DocId, rev: impl Into<String>) -> Self {
        Self {
            id,
            rev: Some(rev.into()),
            error: None,
        }
    }

    pub fn failed(id: DocId, reason: impl Into<String>) -> Self {
        Self {
            id,
            rev: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
