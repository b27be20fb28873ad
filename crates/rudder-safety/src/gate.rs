use rudder_core::{Command, PolicyConfig, PolicyMode, SafetyLevel};

/// Gate decision for one classified command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVerdict {
    /// Run without asking.
    Admit,
    /// Refuse to run; the command is never executed.
    Deny { reason: String },
    /// Ask the operator before running.
    Confirm,
}

impl PolicyVerdict {
    #[must_use]
    pub fn is_deny(&self) -> bool {
        matches!(self, Self::Deny { .. })
    }
}

/// Decides whether a classified command may run.
///
/// Precedence is fixed: the block list vetoes everything, including entries
/// that also appear in the allow list; then the mode applies; then the safety
/// tier. The gate never mutates the command and never spawns anything.
#[derive(Debug, Clone)]
pub struct PolicyGate {
    mode: PolicyMode,
    allowed: Vec<String>,
    blocked: Vec<String>,
}

impl PolicyGate {
    /// Build a gate from a loaded policy. List entries are lowercased once
    /// here so matching stays case-insensitive without per-call allocation.
    #[must_use]
    pub fn new(policy: &PolicyConfig) -> Self {
        let lower = |list: &[String]| {
            list.iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            mode: policy.mode,
            allowed: lower(&policy.allowed_commands),
            blocked: lower(&policy.blocked_commands),
        }
    }

    /// Evaluate one command. `auto_run` reflects a session-level
    /// pre-authorization (e.g. a `--yes` flag): it downgrades
    /// confirmation prompts to admits but never overrides a deny.
    #[must_use]
    pub fn evaluate(&self, command: &Command, auto_run: bool) -> PolicyVerdict {
        let text = command.text.to_lowercase();
        let token = command.leading_token().to_lowercase();

        if let Some(pattern) = self.blocked_match(&text, &token) {
            tracing::warn!(command = %command.text, %pattern, "blocked by policy");
            return PolicyVerdict::Deny {
                reason: format!("matches blocked pattern `{pattern}`"),
            };
        }

        if self.mode == PolicyMode::ConfirmAll {
            return PolicyVerdict::Confirm;
        }

        if self.mode == PolicyMode::Restricted
            && !self.allowed.is_empty()
            && !self.allowed.iter().any(|p| token == *p)
        {
            return PolicyVerdict::Deny {
                reason: format!("`{token}` is not on the allow list"),
            };
        }

        if command.safety_level == SafetyLevel::Dangerous && !auto_run {
            return PolicyVerdict::Confirm;
        }

        PolicyVerdict::Admit
    }

    /// A blocked pattern matches as a prefix of the leading token or as a
    /// substring of the full command text.
    fn blocked_match(&self, text: &str, token: &str) -> Option<&str> {
        self.blocked
            .iter()
            .find(|p| token.starts_with(p.as_str()) || text.contains(p.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(text: &str, level: SafetyLevel) -> Command {
        let mut cmd = Command::new(text);
        cmd.safety_level = level;
        cmd
    }

    fn policy(mode: PolicyMode, allowed: &[&str], blocked: &[&str]) -> PolicyConfig {
        PolicyConfig {
            mode,
            allowed_commands: allowed.iter().map(ToString::to_string).collect(),
            blocked_commands: blocked.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn unrestricted_admits_safe_and_caution() {
        let gate = PolicyGate::new(&PolicyConfig::default());
        assert_eq!(
            gate.evaluate(&command("ls -la", SafetyLevel::Safe), false),
            PolicyVerdict::Admit
        );
        assert_eq!(
            gate.evaluate(&command("mkdir demo", SafetyLevel::Caution), false),
            PolicyVerdict::Admit
        );
    }

    #[test]
    fn dangerous_requires_confirmation() {
        let gate = PolicyGate::new(&PolicyConfig::default());
        assert_eq!(
            gate.evaluate(&command("rm -rf /", SafetyLevel::Dangerous), false),
            PolicyVerdict::Confirm
        );
    }

    #[test]
    fn auto_run_admits_dangerous() {
        let gate = PolicyGate::new(&PolicyConfig::default());
        assert_eq!(
            gate.evaluate(&command("rm -rf build", SafetyLevel::Dangerous), true),
            PolicyVerdict::Admit
        );
    }

    #[test]
    fn blocked_pattern_denies() {
        let gate = PolicyGate::new(&policy(PolicyMode::Unrestricted, &[], &["rm -rf"]));
        let verdict = gate.evaluate(&command("rm -rf /home", SafetyLevel::Dangerous), false);
        assert!(verdict.is_deny());
    }

    #[test]
    fn block_list_beats_auto_run() {
        let gate = PolicyGate::new(&policy(PolicyMode::Unrestricted, &[], &["mkfs"]));
        let verdict = gate.evaluate(&command("mkfs.ext4 /dev/sdb1", SafetyLevel::Dangerous), true);
        assert!(verdict.is_deny());
    }

    #[test]
    fn block_list_beats_allow_list() {
        let gate = PolicyGate::new(&policy(PolicyMode::Restricted, &["rm"], &["rm"]));
        let verdict = gate.evaluate(&command("rm notes.txt", SafetyLevel::Caution), false);
        assert!(verdict.is_deny());
    }

    #[test]
    fn blocked_match_is_case_insensitive() {
        let gate = PolicyGate::new(&policy(PolicyMode::Unrestricted, &[], &["MKFS"]));
        assert!(
            gate.evaluate(&command("mkfs.ext4 /dev/sdb1", SafetyLevel::Dangerous), false)
                .is_deny()
        );
    }

    #[test]
    fn blocked_matches_substring_of_full_text() {
        let gate = PolicyGate::new(&policy(PolicyMode::Unrestricted, &[], &["ufw disable"]));
        assert!(
            gate.evaluate(&command("sudo ufw disable", SafetyLevel::Dangerous), false)
                .is_deny()
        );
    }

    #[test]
    fn restricted_mode_enforces_allow_list() {
        let gate = PolicyGate::new(&policy(PolicyMode::Restricted, &["ls", "cat"], &[]));
        assert_eq!(
            gate.evaluate(&command("ls -la", SafetyLevel::Safe), false),
            PolicyVerdict::Admit
        );
        assert_eq!(
            gate.evaluate(&command("cat /etc/hosts", SafetyLevel::Safe), false),
            PolicyVerdict::Admit
        );
        assert!(
            gate.evaluate(&command("rm -rf /", SafetyLevel::Dangerous), false)
                .is_deny()
        );
    }

    #[test]
    fn restricted_allow_list_ignores_sudo_prefix() {
        let gate = PolicyGate::new(&policy(PolicyMode::Restricted, &["apt"], &[]));
        assert_eq!(
            gate.evaluate(&command("sudo apt install jq", SafetyLevel::Caution), false),
            PolicyVerdict::Admit
        );
    }

    #[test]
    fn restricted_with_empty_allow_list_behaves_unrestricted() {
        let gate = PolicyGate::new(&policy(PolicyMode::Restricted, &[], &[]));
        assert_eq!(
            gate.evaluate(&command("anything --at-all", SafetyLevel::Safe), false),
            PolicyVerdict::Admit
        );
    }

    #[test]
    fn confirm_all_prompts_for_everything() {
        let gate = PolicyGate::new(&policy(PolicyMode::ConfirmAll, &[], &[]));
        assert_eq!(
            gate.evaluate(&command("echo hi", SafetyLevel::Safe), false),
            PolicyVerdict::Confirm
        );
        assert_eq!(
            gate.evaluate(&command("mkdir demo", SafetyLevel::Caution), false),
            PolicyVerdict::Confirm
        );
    }

    #[test]
    fn confirm_all_still_denies_blocked() {
        let gate = PolicyGate::new(&policy(PolicyMode::ConfirmAll, &[], &["shutdown"]));
        assert!(
            gate.evaluate(&command("shutdown now", SafetyLevel::Caution), false)
                .is_deny()
        );
    }

    #[test]
    fn list_entries_are_trimmed_and_blank_entries_dropped() {
        let gate = PolicyGate::new(&policy(PolicyMode::Unrestricted, &[], &["  rm -rf  ", ""]));
        assert!(
            gate.evaluate(&command("rm -rf /srv", SafetyLevel::Dangerous), false)
                .is_deny()
        );
        assert_eq!(
            gate.evaluate(&command("echo hi", SafetyLevel::Safe), false),
            PolicyVerdict::Admit
        );
    }

    #[test]
    fn deny_reason_names_the_pattern() {
        let gate = PolicyGate::new(&policy(PolicyMode::Unrestricted, &[], &["dd"]));
        match gate.evaluate(&command("dd if=/dev/zero of=/dev/sda", SafetyLevel::Dangerous), false)
        {
            PolicyVerdict::Deny { reason } => assert!(reason.contains("dd")),
            other => panic!("expected deny, got {other:?}"),
        }
    }
}
