//! Operator prompts used during interactive credential resolution.

use std::collections::VecDeque;
use std::sync::Mutex;

use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt failed: {0}")]
    Inquire(#[from] inquire::InquireError),
    #[error("prompt cancelled by the operator")]
    Cancelled,
    #[error("no scripted answer left for: {0}")]
    Exhausted(String),
}

pub trait Prompter: Send + Sync {
    fn identity(&self, message: &str, default: Option<&str>) -> Result<String, PromptError>;
    fn secret(&self, message: &str) -> Result<SecretString, PromptError>;
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError>;
}

/// Terminal prompts.
#[derive(Default)]
pub struct InquirePrompter;

fn cancelled(error: inquire::InquireError) -> PromptError {
    match error {
        inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted => {
            PromptError::Cancelled
        }
        other => PromptError::Inquire(other),
    }
}

impl Prompter for InquirePrompter {
    fn identity(&self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        let mut prompt = Text::new(message);
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        prompt.prompt().map_err(cancelled)
    }

    fn secret(&self, message: &str) -> Result<SecretString, PromptError> {
        Password::new(message)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .map(SecretString::from)
            .map_err(cancelled)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        Confirm::new(message)
            .with_default(default)
            .prompt()
            .map_err(cancelled)
    }
}

/// Canned answers, consumed in order. `None` for a confirmation takes the default.
#[derive(Default)]
pub struct ScriptedPrompter {
    identities: Mutex<VecDeque<String>>,
    secrets: Mutex<VecDeque<String>>,
    confirmations: Mutex<VecDeque<Option<bool>>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(self, value: &str) -> Self {
        if let Ok(mut identities) = self.identities.lock() {
            identities.push_back(value.to_string());
        }
        self
    }

    pub fn with_secret(self, value: &str) -> Self {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.push_back(value.to_string());
        }
        self
    }

    pub fn with_confirmation(self, value: Option<bool>) -> Self {
        if let Ok(mut confirmations) = self.confirmations.lock() {
            confirmations.push_back(value);
        }
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn identity(&self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        let next = self.identities.lock().ok().and_then(|mut q| q.pop_front());
        next.or_else(|| default.map(str::to_string))
            .ok_or_else(|| PromptError::Exhausted(message.to_string()))
    }

    fn secret(&self, message: &str) -> Result<SecretString, PromptError> {
        self.secrets
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .map(SecretString::from)
            .ok_or_else(|| PromptError::Exhausted(message.to_string()))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        self.confirmations
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .map(|answer| answer.unwrap_or(default))
            .ok_or_else(|| PromptError::Exhausted(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_scripted_answers_in_order() {
        let prompter = ScriptedPrompter::new()
            .with_identity("alice")
            .with_secret("one")
            .with_secret("two")
            .with_confirmation(None)
            .with_confirmation(Some(true));

        assert_eq!(prompter.identity("User", None).unwrap(), "alice");
        assert_eq!(prompter.identity("User", Some("fallback")).unwrap(), "fallback");
        assert_eq!(prompter.secret("Password").unwrap().expose_secret(), "one");
        assert_eq!(prompter.secret("Password").unwrap().expose_secret(), "two");
        assert!(!prompter.confirm("Save?", false).unwrap());
        assert!(prompter.confirm("Save?", false).unwrap());
        assert!(matches!(prompter.secret("Password"), Err(PromptError::Exhausted(_))));
    }
}
