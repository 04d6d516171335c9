//! Opt-in per-interface serialisation.

use std::collections::HashMap;
use std::sync::Arc;

use kvm_validation::{InterfaceName, Sanitized};
use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Hands out one async mutex per interface name.
///
/// Holding the guard serialises callers that go through the same
/// `InterfaceLocks`. It does nothing against other processes or against
/// direct use of the store.
#[derive(Debug, Clone, Default)]
pub struct InterfaceLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl InterfaceLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `interface`.
    pub async fn lock(&self, interface: &Sanitized<InterfaceName>) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(interface.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvm_validation::sanitize_interface_name;
    use std::time::Duration;

    fn name(s: &str) -> Sanitized<InterfaceName> {
        sanitize_interface_name(s).expect("valid name")
    }

    #[tokio::test]
    async fn same_interface_is_exclusive() {
        let locks = InterfaceLocks::new();
        let guard = locks.lock(&name("wg0")).await;

        let waiter = locks.clone();
        let pending = tokio::spawn(async move {
            let _guard = waiter.lock(&name("wg0")).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        drop(guard);
        pending.await.expect("waiter completes");
    }

    #[tokio::test]
    async fn different_interfaces_do_not_block() {
        let locks = InterfaceLocks::new();
        let _wg0 = locks.lock(&name("wg0")).await;
        let wg1 = tokio::time::timeout(Duration::from_millis(100), locks.lock(&name("wg1"))).await;
        assert!(wg1.is_ok());
    }
}
