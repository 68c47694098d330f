//! Readiness premise reported before a job is scheduled.

use serde::Serialize;
use std::path::PathBuf;

use crate::locale::{Locale, LocalizedText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PremiseState {
    Ready,
    Block,
}

/// Go/no-go signal. Recomputed on every request, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct Premise {
    pub state: PremiseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<LocalizedText>,
}

impl Premise {
    pub fn ready() -> Self {
        Self {
            state: PremiseState::Ready,
            message: None,
        }
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self {
            state: PremiseState::Block,
            message: Some(LocalizedText::fixed(Some(message.into()))),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == PremiseState::Ready
    }

    pub fn message(&self, locale: &Locale) -> Option<String> {
        self.message.as_ref().and_then(|m| m.resolve(locale))
    }
}

impl Default for Premise {
    fn default() -> Self {
        Self::ready()
    }
}

/// Where the host intends to run a job.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub folder: PathBuf,
}

impl Target {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}
