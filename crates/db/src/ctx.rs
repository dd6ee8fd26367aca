use std::ops;
use std::sync::{Arc, Mutex};

use redb_bincode::WriteTransaction;

type CommitHook = Box<dyn FnOnce() + 'static>;

/// A write transaction with hooks to run after it commits
pub struct WriteTransactionCtx {
    commit_hook_order_lock: Arc<Mutex<()>>,
    dbtx: WriteTransaction,
    on_commit: Mutex<Vec<CommitHook>>,
}

impl WriteTransactionCtx {
    pub fn new(dbtx: WriteTransaction, commit_hook_order_lock: Arc<Mutex<()>>) -> Self {
        Self {
            dbtx,
            on_commit: Mutex::new(vec![]),
            commit_hook_order_lock,
        }
    }
}

impl ops::Deref for WriteTransactionCtx {
    type Target = WriteTransaction;

    fn deref(&self) -> &Self::Target {
        &self.dbtx
    }
}

impl WriteTransactionCtx {
    /// Register `f` to run once the transaction is durably committed
    ///
    /// Hooks are dropped without running if the transaction aborts.
    pub fn on_commit(&self, f: impl FnOnce() + 'static) {
        self.on_commit
            .lock()
            .expect("Locking failed")
            .push(Box::new(f));
    }

    pub(super) fn commit(self) -> Result<(), redb::CommitError> {
        let Self {
            dbtx,
            on_commit,
            commit_hook_order_lock,
        } = self;

        // Hooks of consecutive transactions must run in commit order
        let _guard = commit_hook_order_lock.lock().expect("Can't fail");

        dbtx.commit()?;

        for hook in on_commit.lock().expect("Locking failed").drain(..) {
            hook();
        }
        Ok(())
    }
}
