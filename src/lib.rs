//! credstore
//!
//! Store, fetch and delete one secret per `(service, account)` in whatever
//! credential store the operating system provides:
//!
//! - Linux and the BSDs: Secret Service over D-Bus (GNOME Keyring, KWallet, ...)
//! - macOS: the login keychain, through `/usr/bin/security`
//! - Windows: Credential Manager
//!
//! ```no_run
//! credstore::set("my-app", "anon", "secret")?;
//! assert_eq!(credstore::get("my-app", "anon")?, "secret");
//! credstore::delete("my-app", "anon")?;
//! # Ok::<(), credstore::Error>(())
//! ```
//!
//! # Backend binding
//!
//! All free functions dispatch to one process-wide backend, chosen on first
//! use. [`install_mock`] swaps in an in-memory store for tests. Installing
//! while other threads are calling into the store is a race: calls already
//! in flight finish on the backend they started with, and no ordering
//! between an install and concurrent calls is guaranteed. Install once,
//! before spawning workers.

pub mod backend;
pub mod config;
pub mod error;

pub use backend::Backend;
pub use backend::mock::MockBackend;
pub use error::{Error, Result};

use parking_lot::RwLock;
use std::sync::Arc;

/// The active backend. Empty until first use or the first install.
static ACTIVE: RwLock<Option<Arc<dyn Backend>>> = RwLock::new(None);

fn active() -> Arc<dyn Backend> {
    // Clone out so the lock is not held across a blocking backend call.
    let current = ACTIVE.read().clone();
    if let Some(backend) = current {
        return backend;
    }
    let mut slot = ACTIVE.write();
    let backend = slot.get_or_insert_with(|| {
        let backend = backend::platform_backend(&config::Settings::load());
        log::debug!("bound credential backend '{}'", backend.name());
        backend
    });
    Arc::clone(backend)
}

/// Replace the active backend for the whole process.
pub fn install_backend(backend: Arc<dyn Backend>) {
    log::info!("installing credential backend '{}'", backend.name());
    *ACTIVE.write() = Some(backend);
}

/// Bind a fresh, empty in-memory backend. Never touches the OS store.
pub fn install_mock() {
    install_backend(Arc::new(MockBackend::new()));
}

/// Bind an in-memory backend that fails every call with `err`.
pub fn install_mock_with_error(err: Error) {
    install_backend(Arc::new(MockBackend::with_error(err)));
}

/// Name of the active backend, e.g. `"secret-service"` or `"mock"`.
pub fn backend_name() -> &'static str {
    active().name()
}

/// Create or replace the secret for `(service, account)`.
pub fn set(service: &str, account: &str, secret: &str) -> Result<()> {
    active().set(service, account, secret)
}

/// Fetch the secret for `(service, account)`.
///
/// Returns [`Error::NotFound`] when nothing is stored under that key.
pub fn get(service: &str, account: &str) -> Result<String> {
    active().get(service, account)
}

/// Delete the secret for `(service, account)`.
///
/// Returns [`Error::NotFound`] when nothing is stored under that key.
pub fn delete(service: &str, account: &str) -> Result<()> {
    active().delete(service, account)
}

/// Delete every secret stored for `service`. Succeeds if there were none.
pub fn delete_all(service: &str) -> Result<()> {
    active().delete_all(service)
}
