use crate::config::Settings;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Backend trait for secret storage
///
/// A credential is keyed by `(service, account)`; `set` is an upsert. `get`
/// and `delete` return [`Error::NotFound`] when no credential exists.
pub trait Backend: Send + Sync {
    /// Short stable name, e.g. `"secret-service"`
    fn name(&self) -> &'static str;

    /// Create or replace the secret for `(service, account)`
    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()>;

    /// Fetch the secret for `(service, account)`
    fn get(&self, service: &str, account: &str) -> Result<String>;

    /// Delete the secret for `(service, account)`
    fn delete(&self, service: &str, account: &str) -> Result<()>;

    /// Delete every secret stored under `service`; succeeds when there are none
    fn delete_all(&self, service: &str) -> Result<()>;
}

pub mod command;
pub mod keychain;
pub mod mock;

#[cfg(all(
    feature = "secret-service-backend",
    any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    )
))]
pub mod secret_service;

pub mod windows_credential_manager;

/// Fallback bound on platforms without a native store.
pub struct UnsupportedBackend;

impl UnsupportedBackend {
    fn error() -> Error {
        Error::Unsupported(format!(
            "no credential store backend for target_os `{}`",
            std::env::consts::OS
        ))
    }
}

impl Backend for UnsupportedBackend {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn set(&self, _service: &str, _account: &str, _secret: &str) -> Result<()> {
        Err(Self::error())
    }

    fn get(&self, _service: &str, _account: &str) -> Result<String> {
        Err(Self::error())
    }

    fn delete(&self, _service: &str, _account: &str) -> Result<()> {
        Err(Self::error())
    }

    fn delete_all(&self, _service: &str) -> Result<()> {
        Err(Self::error())
    }
}

/// The backend native to the platform this crate was compiled for.
#[cfg(all(
    feature = "secret-service-backend",
    any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    )
))]
pub fn platform_backend(settings: &Settings) -> Arc<dyn Backend> {
    Arc::new(secret_service::SecretServiceBackend::new(
        settings.collection.clone(),
    ))
}

#[cfg(target_os = "macos")]
pub fn platform_backend(settings: &Settings) -> Arc<dyn Backend> {
    Arc::new(keychain::KeychainBackend::new(settings.security_bin.clone()))
}

#[cfg(all(feature = "windows-credential-manager", target_os = "windows"))]
pub fn platform_backend(_settings: &Settings) -> Arc<dyn Backend> {
    match windows_credential_manager::WindowsCredentialManagerBackend::new() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            log::warn!("Windows Credential Manager unavailable: {e}");
            Arc::new(UnsupportedBackend)
        }
    }
}

#[cfg(not(any(
    all(
        feature = "secret-service-backend",
        any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )
    ),
    target_os = "macos",
    all(feature = "windows-credential-manager", target_os = "windows")
)))]
pub fn platform_backend(_settings: &Settings) -> Arc<dyn Backend> {
    Arc::new(UnsupportedBackend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_backend_rejects_everything() {
        let b = UnsupportedBackend;
        assert_eq!(b.name(), "unsupported");
        assert!(matches!(b.set("s", "a", "v"), Err(Error::Unsupported(_))));
        assert!(matches!(b.get("s", "a"), Err(Error::Unsupported(_))));
        assert!(matches!(b.delete("s", "a"), Err(Error::Unsupported(_))));
        assert!(matches!(b.delete_all("s"), Err(Error::Unsupported(_))));
    }
}
