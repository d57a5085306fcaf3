//! Cisco IOS platform definition.
//!
//! Privilege levels:
//! - `Exec` - User EXEC mode with `>` prompt
//! - `PrivilegeExec` - Privileged EXEC mode with `#` prompt
//! - `Configuration` - Configuration mode with `(config*)#` prompt
//!
//! Prompt patterns are adapted from [scrapli](https://github.com/carlmontanari/scrapli).
//!
//! # Prompt Examples
//!
//! ```text
//! R1>                    # exec mode
//! R1#                    # privilege_exec mode
//! R1(config)#            # configuration mode
//! R1(config-if)#         # config sub-mode (interface)
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use regex::bytes::Regex;

use super::{LoginPrompts, Platform, PrivilegeLevel, PromptDefinition};

/// Create the Cisco IOS platform definition.
///
/// Uses `(?mi)` flags for multiline (^ matches line start) and case-insensitive matching.
pub fn platform() -> Platform {
    let exec = PromptDefinition::new(PrivilegeLevel::Exec, r"(?mi)^[\w.\-@()/: ]{1,63}>\s?$")
        .unwrap();

    // not_contains "(conf" prevents matching config mode prompts
    let privilege_exec =
        PromptDefinition::new(PrivilegeLevel::PrivilegeExec, r"(?mi)^[\w.\-@()/: ]{1,63}#\s?$")
            .unwrap()
            .with_parent(PrivilegeLevel::Exec)
            .with_escalate("enable")
            .with_deescalate("disable")
            .with_auth(r"(?mi)^password:\s?$")
            .unwrap()
            .with_not_contains("(conf");

    let configuration = PromptDefinition::new(
        PrivilegeLevel::Configuration,
        r"(?mi)^[\w.\-@/: ]{1,63}\(conf[\w.\-@/:+]{0,63}\)#\s?$",
    )
    .unwrap()
    .with_parent(PrivilegeLevel::PrivilegeExec)
    .with_escalate("configure terminal")
    .with_deescalate("end");

    let login = LoginPrompts {
        username: Regex::new(r"(?mi)^.*(user ?name|login)\s?:\s?$").unwrap(),
        password: Regex::new(r"(?mi)^.*pass(word|code)\s?:\s?$").unwrap(),
    };

    Platform::new("cisco_ios", vec![exec, privilege_exec, configuration], login)
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_identity_command("show version | include uptime")
}
