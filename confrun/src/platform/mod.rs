//! Device CLI grammar.
//!
//! A [`Platform`] describes everything the session needs to know about the
//! device's command line: how each privilege level's prompt looks, how to
//! move between levels, what the login prompts look like, and which
//! commands prepare the terminal.

pub mod ios;
mod privilege_level;

pub use privilege_level::{PrivilegeLevel, PromptDefinition};

use regex::bytes::Regex;

/// In-band login prompts (used by transports without protocol-level auth).
#[derive(Debug, Clone)]
pub struct LoginPrompts {
    /// Matches the username prompt.
    pub username: Regex,

    /// Matches the password prompt.
    pub password: Regex,
}

/// Platform definition for a device CLI.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Platform name (e.g. "cisco_ios").
    pub name: String,

    /// Privilege levels, root first.
    pub levels: Vec<PromptDefinition>,

    /// In-band login prompts.
    pub login: LoginPrompts,

    /// Commands run once privileged mode is reached.
    pub on_open_commands: Vec<String>,

    /// Read-only command whose first output token names the device.
    pub identity_command: String,

    /// Combined pattern matching any privilege level's prompt.
    prompt_pattern: Regex,

    /// Combined pattern matching a login prompt or any CLI prompt.
    login_pattern: Regex,
}

impl Platform {
    /// Create a platform from its privilege levels and login prompts.
    pub fn new(name: impl Into<String>, levels: Vec<PromptDefinition>, login: LoginPrompts) -> Self {
        let prompt_pattern = combine(levels.iter().map(|level| &level.pattern));
        let login_pattern = combine(
            [&login.username, &login.password]
                .into_iter()
                .chain(levels.iter().map(|level| &level.pattern)),
        );

        Self {
            name: name.into(),
            levels,
            login,
            on_open_commands: vec![],
            identity_command: String::new(),
            prompt_pattern,
            login_pattern,
        }
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set the identity command.
    pub fn with_identity_command(mut self, command: impl Into<String>) -> Self {
        self.identity_command = command.into();
        self
    }

    /// Get the definition of a privilege level.
    pub fn level(&self, level: PrivilegeLevel) -> Option<&PromptDefinition> {
        self.levels.iter().find(|def| def.level == level)
    }

    /// Determine the privilege level from a prompt string.
    pub fn determine_level(&self, prompt: &str) -> Option<PrivilegeLevel> {
        self.levels
            .iter()
            .find(|def| def.matches(prompt))
            .map(|def| def.level)
    }

    /// Pattern matching any privilege level's prompt.
    pub fn prompt_pattern(&self) -> &Regex {
        &self.prompt_pattern
    }

    /// Pattern matching a login prompt or any privilege level's prompt.
    pub fn login_pattern(&self) -> &Regex {
        &self.login_pattern
    }

    /// Pattern for the secret prompt, or any CLI prompt, after `enable`.
    pub fn escalate_pattern(&self) -> Regex {
        match self
            .level(PrivilegeLevel::PrivilegeExec)
            .and_then(|def| def.escalate_prompt.as_ref())
        {
            Some(secret) => combine([secret, &self.prompt_pattern]),
            None => self.prompt_pattern.clone(),
        }
    }
}

/// Build a single alternation out of several patterns.
///
/// Each pattern keeps its own inline flags because it is wrapped in a
/// non-capturing group.
fn combine<'a>(patterns: impl IntoIterator<Item = &'a Regex>) -> Regex {
    let combined = patterns
        .into_iter()
        .map(|pattern| format!("(?:{})", pattern.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&combined).unwrap_or_else(|_| Regex::new(r"[>#]\s*$").unwrap())
}

/// Last non-empty line of device output, trimmed.
///
/// After a prompt-terminated read this is the prompt itself.
pub fn last_line(output: &str) -> &str {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("show clock\n10:02\nR1# "), "R1#");
        assert_eq!(last_line("enable\nPassword: \n\n"), "Password:");
        assert_eq!(last_line(""), "");
    }

    #[test]
    fn test_escalate_pattern() {
        let platform = ios::platform();
        let pattern = platform.escalate_pattern();
        assert!(pattern.is_match(b"enable\nPassword: "));
        assert!(pattern.is_match(b"enable\nR1#"));
        assert!(pattern.is_match(b"% Access denied\n\nR1>"));
    }

    #[test]
    fn test_login_pattern() {
        let platform = ios::platform();
        let pattern = platform.login_pattern();
        assert!(pattern.is_match(b"\nUser Access Verification\n\nUsername: "));
        assert!(pattern.is_match(b"Password: "));
        assert!(pattern.is_match(b"\nR1>"));
        assert!(!pattern.is_match(b"\nUser Access Verification\n"));
    }
}
