use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk tier assigned to a command, ordered by severity.
///
/// The ordering is meaningful: `Safe < Caution < Dangerous`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    #[default]
    Safe,
    Caution,
    Dangerous,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Dangerous => "dangerous",
        };
        f.write_str(s)
    }
}

/// A proposed shell invocation plus its classification metadata.
///
/// Planner output carries advisory values only; the classifier owns the final
/// `safety_level`, `requires_sudo`, and `revert`, and those are immutable once
/// execution begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub text: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub safety_level: SafetyLevel,
    #[serde(default)]
    pub requires_sudo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert: Option<String>,
    /// Ordinal for multi-step plans, display ordering only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
}

impl Command {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            explanation: String::new(),
            safety_level: SafetyLevel::default(),
            requires_sudo: false,
            revert: None,
            step: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    /// First whitespace-separated token, with any elevation prefix stripped.
    ///
    /// `sudo apt install curl` has a leading token of `apt`; policy lists
    /// name programs, not elevation wrappers.
    #[must_use]
    pub fn leading_token(&self) -> &str {
        let mut tokens = self.text.split_whitespace();
        let first = tokens.next().unwrap_or("");
        if matches!(first, "sudo" | "doas" | "runas") {
            tokens.next().unwrap_or(first)
        } else {
            first
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
