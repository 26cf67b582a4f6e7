//! Transaction id source.

use crate::domain::TransactionId;

/// Produces ids for new transactions. Injected so tests can fix them.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> TransactionId;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> TransactionId {
        TransactionId::new()
    }
}
