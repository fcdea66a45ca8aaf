//! Per-account sequence number allocation.

use std::collections::HashMap;
use std::sync::Arc;

use ledger::LedgerGateway;
use study_core::model::StudentAddress;
use tokio::sync::Mutex;

use crate::error::ClientError;

/// Hands out strictly increasing sequence numbers per source account.
///
/// The ledger's counter is read once per account; after that, reservations
/// bump a local shadow so concurrent submissions from the same keypair never
/// share a number. The shadow can drift from the ledger when another client
/// submits for the same account; [`SequenceAllocator::refresh`] drops it so
/// the next reservation re-reads the real counter.
pub struct SequenceAllocator {
    gateway: Arc<dyn LedgerGateway>,
    reserved: Mutex<HashMap<StudentAddress, u64>>,
}

impl SequenceAllocator {
    #[must_use]
    pub fn new(gateway: Arc<dyn LedgerGateway>) -> Self {
        Self {
            gateway,
            reserved: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the next unused sequence number for `account`.
    ///
    /// The lock is held across the first-touch ledger read, so two tasks
    /// reserving for a fresh account cannot both fetch the counter and walk
    /// away with the same number.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the ledger lookup fails.
    pub async fn next(&self, account: &StudentAddress) -> Result<u64, ClientError> {
        let mut reserved = self.reserved.lock().await;
        let next = match reserved.get(account) {
            Some(last) => last + 1,
            None => self.gateway.account_sequence(account).await? + 1,
        };
        reserved.insert(account.clone(), next);
        Ok(next)
    }

    /// Forget the cached counter for `account`; the next reservation asks
    /// the ledger again.
    pub async fn refresh(&self, account: &StudentAddress) {
        self.reserved.lock().await.remove(account);
    }
}
