//! macOS Keychain backend
//!
//! Drives the `security` command-line tool. Writes go through
//! `security -i` so the secret travels over the child's stdin instead of its
//! argv, where any local user could read it with `ps`.
//!
//! Secrets are stored base64-encoded behind [`ENCODING_PREFIX`], which keeps
//! whitespace, newlines and quotes intact across the text interface. Items
//! without the prefix (written by other tools) are returned as plain text.
//!
//! Not-found detection relies on the English wording of the tool's error
//! message; a localized or reworded message is reported as
//! [`Error::Backend`] rather than [`Error::NotFound`].

use super::Backend;
use super::command::{CommandOutput, CommandRunner, SystemRunner};
use crate::error::{Error, Result};
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Marks values written by this crate.
pub const ENCODING_PREFIX: &str = "credstore-base64:";

/// Longest line `security -i` accepts on stdin.
pub const MAX_COMMAND_LEN: usize = 4096;

const NOT_FOUND_MARKER: &str = "could not be found";
const DENIED_MARKERS: [&str; 2] = ["user canceled", "user interaction is not allowed"];

pub struct KeychainBackend<R = SystemRunner> {
    binary: PathBuf,
    runner: R,
}

impl KeychainBackend<SystemRunner> {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self::with_runner(binary, SystemRunner)
    }
}

impl<R: CommandRunner> KeychainBackend<R> {
    pub fn with_runner(binary: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    fn run(&self, verb: &str, args: &[&str], stdin: Option<&[u8]>) -> Result<CommandOutput> {
        self.runner
            .run(&self.binary, args, stdin)
            .map_err(|e| Error::Backend(format!("Failed to run {} ({verb}): {e}", self.binary.display())))
    }

    /// Turn a finished invocation into the canonical outcome.
    fn check(verb: &str, output: &CommandOutput) -> Result<()> {
        if output.success {
            return Ok(());
        }
        let stderr = output.stderr_lossy();
        let lowered = stderr.to_lowercase();
        if lowered.contains(NOT_FOUND_MARKER) {
            return Err(Error::NotFound);
        }
        if DENIED_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Err(Error::AccessDenied(format!("security {verb}: {stderr}")));
        }
        log::warn!("security {verb} failed: {stderr}");
        Err(Error::Backend(format!("security {verb} failed: {stderr}")))
    }

    fn decode(raw: &str) -> Result<String> {
        let Some(payload) = raw.strip_prefix(ENCODING_PREFIX) else {
            return Ok(raw.to_string());
        };
        let bytes = Zeroizing::new(
            BASE64_STANDARD
                .decode(payload)
                .map_err(|e| Error::Backend(format!("Malformed keychain payload: {e}")))?,
        );
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Backend(format!("Keychain secret is not valid UTF-8: {e}")))
    }
}

/// Quote a word for the `security -i` command parser, which splits on
/// whitespace and honours single quotes like a POSIX shell.
fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r#"'"'"'"#))
    }
}

/// `security -i` reads one command per line, so a line break inside a field
/// would start a second command.
fn check_field(what: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r', '\0']) {
        return Err(Error::Backend(format!(
            "keychain {what} must not contain line breaks or NUL"
        )));
    }
    Ok(())
}

impl<R: CommandRunner> Backend for KeychainBackend<R> {
    fn name(&self) -> &'static str {
        "keychain"
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        log::debug!("keychain set service='{service}' account='{account}'");
        check_field("service", service)?;
        check_field("account", account)?;
        let encoded = Zeroizing::new(format!(
            "{ENCODING_PREFIX}{}",
            BASE64_STANDARD.encode(secret.as_bytes())
        ));
        // -U updates an existing item instead of failing with a duplicate.
        let command = Zeroizing::new(format!(
            "add-generic-password -U -s {} -a {} -w {}\n",
            quote(service),
            quote(account),
            quote(&encoded)
        ));
        if command.len() > MAX_COMMAND_LEN {
            return Err(Error::TooLarge {
                limit: MAX_COMMAND_LEN,
            });
        }

        let output = self.run("add-generic-password", &["-i"], Some(command.as_bytes()))?;
        match Self::check("add-generic-password", &output) {
            // Set never reports a missing item.
            Err(Error::NotFound) => Err(Error::Backend(format!(
                "security add-generic-password failed: {}",
                output.stderr_lossy()
            ))),
            other => other,
        }
    }

    fn get(&self, service: &str, account: &str) -> Result<String> {
        log::debug!("keychain get service='{service}' account='{account}'");
        let output = self.run(
            "find-generic-password",
            &["find-generic-password", "-s", service, "-a", account, "-w"],
            None,
        )?;
        Self::check("find-generic-password", &output)?;

        let stdout = Zeroizing::new(
            String::from_utf8(output.stdout)
                .map_err(|e| Error::Backend(format!("security output is not valid UTF-8: {e}")))?,
        );
        Self::decode(stdout.trim_end())
    }

    fn delete(&self, service: &str, account: &str) -> Result<()> {
        log::debug!("keychain delete service='{service}' account='{account}'");
        let output = self.run(
            "delete-generic-password",
            &["delete-generic-password", "-s", service, "-a", account],
            None,
        )?;
        Self::check("delete-generic-password", &output)
    }

    fn delete_all(&self, service: &str) -> Result<()> {
        log::debug!("keychain delete_all service='{service}'");
        // Each call removes the first matching item.
        loop {
            let output = self.run(
                "delete-generic-password",
                &["delete-generic-password", "-s", service],
                None,
            )?;
            match Self::check("delete-generic-password", &output) {
                Ok(()) => continue,
                Err(Error::NotFound) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}
