// libs/booking-cell/src/services/locks.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-doctor async locks serializing schedule read-modify-write cycles
/// inside one process. Other processes sharing the store are not covered.
#[derive(Default)]
pub struct DoctorLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl DoctorLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, doctor_id: Uuid) -> DoctorGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(doctor_id).or_default())
        };

        DoctorGuard {
            _guard: lock.lock_owned().await,
        }
    }
}

pub struct DoctorGuard {
    _guard: OwnedMutexGuard<()>,
}
