//! In-memory backend for tests
//!
//! Nothing leaves the process and nothing survives it. Values are stored
//! exactly as given, with no encoding step.

use super::Backend;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

type Key = (String, String);

#[derive(Debug, Default)]
pub struct MockBackend {
    secrets: Mutex<HashMap<Key, String>>,
    fail_with: Option<Error>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails every operation with `err`.
    pub fn with_error(err: Error) -> Self {
        Self {
            secrets: Mutex::new(HashMap::new()),
            fail_with: Some(err),
        }
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<()> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn key(service: &str, account: &str) -> Key {
        (service.to_string(), account.to_string())
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        self.check()?;
        self.secrets
            .lock()
            .insert(Self::key(service, account), secret.to_string());
        Ok(())
    }

    fn get(&self, service: &str, account: &str) -> Result<String> {
        self.check()?;
        self.secrets
            .lock()
            .get(&Self::key(service, account))
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn delete(&self, service: &str, account: &str) -> Result<()> {
        self.check()?;
        self.secrets
            .lock()
            .remove(&Self::key(service, account))
            .map(drop)
            .ok_or(Error::NotFound)
    }

    fn delete_all(&self, service: &str) -> Result<()> {
        self.check()?;
        self.secrets.lock().retain(|(svc, _), _| svc != service);
        Ok(())
    }
}
