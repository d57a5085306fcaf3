//! Response type for command execution results.

use std::time::Duration;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output with the echoed command and trailing prompt removed.
    pub result: String,

    /// Everything the device printed, echo and prompt included.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,
}

impl Response {
    /// Build a response from the raw output of `command`.
    pub fn new(command: impl Into<String>, raw_result: String, prompt: impl Into<String>, elapsed: Duration) -> Self {
        let command = command.into();
        let result = normalize_output(&raw_result, &command);
        Self {
            command,
            result,
            raw_result,
            prompt: prompt.into(),
            elapsed,
        }
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

/// Strip the command echo from the start and the prompt line from the end.
fn normalize_output(raw: &str, command: &str) -> String {
    let output = raw.trim_start_matches(['\r', '\n']);
    let output = match output.strip_prefix(command) {
        Some(rest) => rest.trim_start_matches(['\r', '\n']),
        None => output,
    };

    match output.rfind('\n') {
        Some(pos) => output[..pos].trim_end_matches('\r').to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let response = Response::new(
            "show version | include uptime",
            "show version | include uptime\nR1 uptime is 2 weeks\nR1#".to_string(),
            "R1#",
            Duration::ZERO,
        );
        assert_eq!(response.result, "R1 uptime is 2 weeks");
        assert_eq!(response.lines().count(), 1);
    }

    #[test]
    fn test_prompt_only_output_is_empty() {
        let response = Response::new("terminal length 0", "terminal length 0\nR1#".to_string(), "R1#", Duration::ZERO);
        assert_eq!(response.result, "");
        assert_eq!(response.to_string(), "");
    }
}
