//! Command allowlist for `run_terminal_cmd`.

/// Why a command was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandRejected {
    #[error("empty command")]
    Empty,

    #[error("command '{program}' is not in the allowlist ({allowed} allowed)")]
    NotAllowed { program: String, allowed: usize },
}

/// Check a shell command line against the allowlist.
///
/// Rules:
/// - Empty allowlist, or one containing `"*"` → allow any command
/// - Otherwise the first word (program name, path stripped) must be listed
pub fn check_command(command: &str, allowed_commands: &[String]) -> Result<(), CommandRejected> {
    let first = command
        .split_whitespace()
        .next()
        .ok_or(CommandRejected::Empty)?;

    if allowed_commands.is_empty() || allowed_commands.iter().any(|c| c == "*") {
        return Ok(());
    }

    let program = first.rsplit('/').next().unwrap_or(first);
    if allowed_commands.iter().any(|c| c == program) {
        Ok(())
    } else {
        tracing::warn!(program = %program, "Command rejected by allowlist");
        Err(CommandRejected::NotAllowed {
            program: program.to_string(),
            allowed: allowed_commands.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allowlist_allows_all() {
        assert!(check_command("rm -rf build", &[]).is_ok());
    }

    #[test]
    fn wildcard_allows_all() {
        assert!(check_command("anything --flag", &["*".into()]).is_ok());
    }

    #[test]
    fn listed_program_allowed() {
        let allowed = vec!["cargo".to_string(), "ls".to_string()];
        assert!(check_command("cargo test --workspace", &allowed).is_ok());
        assert!(check_command("/bin/ls -la", &allowed).is_ok());
    }

    #[test]
    fn unlisted_program_rejected() {
        let allowed = vec!["cargo".to_string()];
        assert_eq!(
            check_command("curl http://x", &allowed),
            Err(CommandRejected::NotAllowed {
                program: "curl".into(),
                allowed: 1
            })
        );
    }

    #[test]
    fn blank_command_rejected() {
        assert_eq!(check_command("   ", &[]), Err(CommandRejected::Empty));
    }
}
