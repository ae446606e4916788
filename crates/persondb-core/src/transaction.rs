//! RAII transactional scope over a [`RecordStore`].

use crate::traits::{RecordSession, RecordStore};

/// Opened with [`TransactionScope::begin`]. Committed either explicitly with
/// [`TransactionScope::commit`] or, on any other exit path (early return,
/// `?`, panic unwinding), when dropped. The store stays exclusively held by
/// this scope until then.
#[must_use = "dropping the scope commits immediately"]
pub struct TransactionScope<'a, S: RecordStore + 'a> {
    session: S::Session<'a>,
    open: bool,
}

impl<'a, S: RecordStore + 'a> TransactionScope<'a, S> {
    pub fn begin(store: &'a S) -> anyhow::Result<Self> {
        let session = store.begin_transaction()?;
        Ok(Self { session, open: true })
    }

    pub fn session(&self) -> &S::Session<'a> {
        &self.session
    }

    pub fn commit(mut self) -> anyhow::Result<()> {
        self.open = false;
        self.session.commit()
    }
}

impl<'a, S: RecordStore + 'a> Drop for TransactionScope<'a, S> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.session.commit() {
                tracing::error!(error = %e, "commit on scope exit failed");
            }
        }
    }
}

/// Runs `body` inside one transactional scope and commits afterwards,
/// whatever `body` returned.
pub fn in_transaction<'a, S, T, F>(store: &'a S, body: F) -> anyhow::Result<T>
where
    S: RecordStore + 'a,
    F: FnOnce(&S::Session<'a>) -> anyhow::Result<T>,
{
    let scope = TransactionScope::begin(store)?;
    let out = body(scope.session())?;
    scope.commit()?;
    Ok(out)
}
