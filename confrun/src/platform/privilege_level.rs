//! Privilege level definitions.

use regex::bytes::Regex;

/// CLI mode a session can be in, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrivilegeLevel {
    /// User EXEC mode (`>` prompt).
    Exec,

    /// Privileged EXEC mode (`#` prompt), reached with `enable`.
    PrivilegeExec,

    /// Global configuration mode (`(config…)#` prompt).
    Configuration,
}

/// How to recognise and enter one privilege level.
///
/// Levels form a chain: each has a parent it is escalated from and a
/// command that drops back to that parent.
#[derive(Debug, Clone)]
pub struct PromptDefinition {
    /// The level this definition describes.
    pub level: PrivilegeLevel,

    /// Regex pattern to match the prompt for this privilege level.
    pub pattern: Regex,

    /// Level this one is escalated from (None for the root level).
    pub previous_priv: Option<PrivilegeLevel>,

    /// Command to escalate TO this level from the parent.
    pub escalate_command: Option<String>,

    /// Command to de-escalate FROM this level to the parent.
    pub deescalate_command: Option<String>,

    /// Pattern of the secret prompt shown during escalation, if any.
    pub escalate_prompt: Option<Regex>,

    /// Strings that must NOT be in the prompt for this level to match.
    /// Used for disambiguation (`#` ends both privileged and config prompts).
    pub not_contains: Vec<String>,
}

impl PromptDefinition {
    /// Create a new definition from a prompt pattern.
    pub fn new(level: PrivilegeLevel, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            level,
            pattern: Regex::new(pattern)?,
            previous_priv: None,
            escalate_command: None,
            deescalate_command: None,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    /// Set the parent privilege level.
    pub fn with_parent(mut self, parent: PrivilegeLevel) -> Self {
        self.previous_priv = Some(parent);
        self
    }

    /// Set the escalation command.
    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    /// Set the de-escalation command.
    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    /// Set that escalation asks for a secret matching `prompt_pattern`.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    /// Add a not_contains pattern.
    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Check if this privilege level matches a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc)) {
            return false;
        }

        self.pattern.is_match(prompt.as_bytes())
    }
}
