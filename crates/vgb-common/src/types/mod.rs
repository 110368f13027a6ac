//! Common types used across VGB

use crate::error::{Result, VgbError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Lifecycle status of one submitted file in the results table.
///
/// Status only moves forward: `Uploading → Processing → {Completed | Error}`.
/// `Uploading → Error` is also allowed for files that fail before a file id
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Uploading,
    Processing,
    Completed,
    Error,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Uploading => "UPLOADING",
            RowStatus::Processing => "PROCESSING",
            RowStatus::Completed => "COMPLETED",
            RowStatus::Error => "ERROR",
        }
    }

    fn rank(self) -> u8 {
        match self {
            RowStatus::Uploading => 0,
            RowStatus::Processing => 1,
            RowStatus::Completed | RowStatus::Error => 2,
        }
    }

    /// Whether the status is final for this processing attempt
    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }

    /// Check that moving to `next` does not regress the lifecycle
    pub fn can_advance_to(self, next: RowStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// Return `next` if the transition is allowed
    pub fn advance(self, next: RowStatus) -> Result<RowStatus> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(VgbError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RowStatus {
    type Err = VgbError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UPLOADING" => Ok(RowStatus::Uploading),
            "PROCESSING" => Ok(RowStatus::Processing),
            "COMPLETED" => Ok(RowStatus::Completed),
            "ERROR" => Ok(RowStatus::Error),
            other => Err(VgbError::Parse(format!("unknown row status '{}'", other))),
        }
    }
}

#[allow(clippy::expect_used)]
fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    // \w is Unicode-aware, so accented letters survive
    UNSAFE.get_or_init(|| Regex::new(r"[^\w.-]").expect("static regex is valid"))
}

/// Upload filename with everything outside `[\w.-]` replaced by `_`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizedName(String);

impl SanitizedName {
    pub fn new(raw: &str) -> Self {
        Self(unsafe_chars().replace_all(raw, "_").into_owned())
    }

    /// Sanitize the final component of a path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(&name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SanitizedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
