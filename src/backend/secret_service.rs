//! Secret Service backend (GNOME Keyring, KWallet, KeePassXC, ...)
//!
//! Items live in one named collection, `login` unless configured otherwise,
//! and are matched on the exact attributes `service` and `username`. The
//! collection is never created here: when it is missing every operation
//! fails with [`Error::Unsupported`].

use super::Backend;
use crate::error::{Error, Result};
use secret_service::blocking::{Collection, Item, SecretService};
use secret_service::{EncryptionType, Error as SsError};
use std::collections::HashMap;
use zeroize::Zeroizing;

const ATTR_SERVICE: &str = "service";
const ATTR_ACCOUNT: &str = "username";
const CONTENT_TYPE: &str = "text/plain";
const DEFAULT_ALIAS: &str = "default";

pub struct SecretServiceBackend {
    collection: String,
}

impl SecretServiceBackend {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    /// Open a session, resolve and unlock the collection, then run `op`.
    fn with_collection<T>(&self, op: impl FnOnce(&Collection<'_>) -> Result<T>) -> Result<T> {
        let ss = SecretService::connect(EncryptionType::Dh).map_err(map_error)?;
        let collection = self.get_collection(&ss)?;
        if collection.is_locked().map_err(map_error)? {
            log::debug!("unlocking collection '{}'", self.collection);
            collection.unlock().map_err(map_error)?;
        }
        op(&collection)
    }

    fn get_collection<'a>(&self, ss: &'a SecretService<'a>) -> Result<Collection<'a>> {
        if self.collection == DEFAULT_ALIAS {
            return ss.get_default_collection().map_err(|e| match e {
                SsError::NoResult => self.missing_collection(),
                other => map_error(other),
            });
        }

        ss.get_all_collections()
            .map_err(map_error)?
            .into_iter()
            .find(|c| {
                c.get_label()
                    .map(|label| label.eq_ignore_ascii_case(&self.collection))
                    .unwrap_or(false)
            })
            .ok_or_else(|| self.missing_collection())
    }

    fn missing_collection(&self) -> Error {
        Error::Unsupported(format!(
            "Secret Service collection '{}' does not exist",
            self.collection
        ))
    }
}

fn attributes<'a>(service: &'a str, account: &'a str) -> HashMap<&'a str, &'a str> {
    HashMap::from([(ATTR_SERVICE, service), (ATTR_ACCOUNT, account)])
}

fn label(service: &str, account: &str) -> String {
    format!("Password for '{account}' on '{service}'")
}

fn map_error(err: SsError) -> Error {
    match err {
        SsError::Locked => Error::AccessDenied("secret service is locked".to_string()),
        SsError::Prompt => Error::AccessDenied("unlock prompt was dismissed".to_string()),
        SsError::ZbusFdo(zbus::fdo::Error::AccessDenied(reason)) => {
            Error::AccessDenied(format!("Secret Service: {reason}"))
        }
        SsError::Unavailable => Error::Backend("no Secret Service provider is available".to_string()),
        other => {
            log::warn!("Secret Service failure: {other}");
            Error::Backend(format!("Secret Service: {other}"))
        }
    }
}

impl Backend for SecretServiceBackend {
    fn name(&self) -> &'static str {
        "secret-service"
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        log::debug!("secret-service set service='{service}' account='{account}'");
        self.with_collection(|collection| {
            let existing = collection
                .search_items(attributes(service, account))
                .map_err(map_error)?;
            if let Some(item) = existing.first() {
                return item
                    .set_secret(secret.as_bytes(), CONTENT_TYPE)
                    .map_err(map_error);
            }
            collection
                .create_item(
                    &label(service, account),
                    attributes(service, account),
                    secret.as_bytes(),
                    true,
                    CONTENT_TYPE,
                )
                .map(drop)
                .map_err(map_error)
        })
    }

    fn get(&self, service: &str, account: &str) -> Result<String> {
        log::debug!("secret-service get service='{service}' account='{account}'");
        self.with_collection(|collection| {
            let items = collection
                .search_items(attributes(service, account))
                .map_err(map_error)?;
            let item = items.first().ok_or(Error::NotFound)?;
            if item.is_locked().map_err(map_error)? {
                item.unlock().map_err(map_error)?;
            }
            let secret = Zeroizing::new(item.get_secret().map_err(map_error)?);
            String::from_utf8(secret.to_vec())
                .map_err(|e| Error::Backend(format!("Secret for {service}/{account} is not valid UTF-8: {e}")))
        })
    }

    fn delete(&self, service: &str, account: &str) -> Result<()> {
        log::debug!("secret-service delete service='{service}' account='{account}'");
        self.with_collection(|collection| {
            let items = collection
                .search_items(attributes(service, account))
                .map_err(map_error)?;
            if items.is_empty() {
                return Err(Error::NotFound);
            }
            for item in items {
                item.delete().map_err(map_error)?;
            }
            Ok(())
        })
    }

    fn delete_all(&self, service: &str) -> Result<()> {
        log::debug!("secret-service delete_all service='{service}'");
        self.with_collection(|collection| {
            let items: Vec<Item> = collection
                .search_items(HashMap::from([(ATTR_SERVICE, service)]))
                .map_err(map_error)?;
            for item in items {
                item.delete().map_err(map_error)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_and_label() {
        let attrs = attributes("my-app", "anon");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["service"], "my-app");
        assert_eq!(attrs["username"], "anon");
        assert_eq!(label("my-app", "anon"), "Password for 'anon' on 'my-app'");
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(map_error(SsError::Locked), Error::AccessDenied(_)));
        assert!(matches!(map_error(SsError::Prompt), Error::AccessDenied(_)));
        assert!(matches!(
            map_error(SsError::ZbusFdo(zbus::fdo::Error::AccessDenied("policy".into()))),
            Error::AccessDenied(_)
        ));
        assert!(matches!(
            map_error(SsError::ZbusFdo(zbus::fdo::Error::Failed("boom".into()))),
            Error::Backend(_)
        ));
        assert!(matches!(map_error(SsError::Unavailable), Error::Backend(_)));
        assert!(matches!(map_error(SsError::NoResult), Error::Backend(_)));
    }

    #[test]
    fn test_missing_collection_names_it() {
        let backend = SecretServiceBackend::new(crate::config::DEFAULT_COLLECTION);
        assert_eq!(backend.name(), "secret-service");
        assert_eq!(
            backend.missing_collection(),
            Error::Unsupported("Secret Service collection 'login' does not exist".into())
        );
    }
}
