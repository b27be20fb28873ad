use std::sync::LazyLock;

use regex::Regex;

use rudder_core::{Command, HostInfo, SafetyLevel};

use crate::revert::revert_command;

/// Classifier output for one raw command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub safety_level: SafetyLevel,
    pub requires_sudo: bool,
    pub revert: Option<String>,
}

struct SafetyRule {
    pattern: Regex,
    level: SafetyLevel,
}

fn rule(pattern: &str, level: SafetyLevel) -> SafetyRule {
    SafetyRule {
        pattern: Regex::new(pattern).expect("static safety pattern"),
        level,
    }
}

/// Ordered match-rule list, most dangerous first. First match wins; input is
/// lowercased and whitespace-collapsed before matching, so the patterns stay
/// free of case classes.
static RULES: LazyLock<Vec<SafetyRule>> = LazyLock::new(|| {
    use SafetyLevel::{Caution, Dangerous};
    vec![
        // recursive deletes under the usual scratch roots stay reversible-ish
        rule(
            r"\brm\s+(--?[a-z-]+\s+)*(-[a-z]*r[a-z]*|--recursive)\s+(/tmp|/var/tmp)/\S+",
            Caution,
        ),
        // filesystem-destructive
        rule(r"\brm\s+(--?[a-z-]+\s+)*(-[a-z]*r[a-z]*|--recursive)(\s|$)", Dangerous),
        rule(r"\bmkfs(\.[a-z0-9]+)?\b", Dangerous),
        rule(r"\bdd\b.*\bof=/dev/", Dangerous),
        rule(r">\s*/dev/(sd|hd|nvme|disk)", Dangerous),
        rule(r"\bformat\s+[a-z]:", Dangerous),
        // fork bomb
        rule(r":\(\)\s*\{", Dangerous),
        // firewall disable
        rule(r"\bufw\s+disable\b", Dangerous),
        rule(r"\bpfctl\s+-d\b", Dangerous),
        rule(r"\bnetsh\s+advfirewall\s+set\b.*\boff\b", Dangerous),
        rule(r"\bsystemctl\s+(stop|disable)\s+(nftables|iptables|firewalld)\b", Dangerous),
        // privilege / user deletion
        rule(r"\b(userdel|deluser|net\s+user\s+\S+\s+/delete)\b", Dangerous),
        // package management
        rule(
            r"\b(apt|apt-get|dnf|yum|pacman|zypper|emerge|brew|winget|choco|scoop)\s+(install|remove|purge|uninstall|upgrade|update|autoremove|-s\b|-r\b|-syu\b)",
            Caution,
        ),
        // services
        rule(r"\b(systemctl|service|launchctl|sc)\s+(start|stop|restart|reload|enable|disable)\b", Caution),
        // permissions and ownership
        rule(r"\b(chmod|chown|chgrp|icacls)\b", Caution),
        // network interface changes
        rule(r"\bip\s+(addr|link|route)\s+(add|del|set)\b", Caution),
        rule(r"\bifconfig\s+\S+\s+(up|down|\d)", Caution),
        rule(r"\bnetsh\s+interface\b", Caution),
        // firewall state changes short of disabling
        rule(r"\b(ufw|iptables|nft|pfctl)\b", Caution),
        // process control
        rule(r"\b(kill|pkill|killall|taskkill)\b", Caution),
        // system power state
        rule(r"\b(shutdown|reboot|halt|poweroff)\b", Caution),
        // single-path file mutation
        rule(r"\b(rm|rmdir|del|unlink)\b", Caution),
        rule(r"\b(mv|move)\b", Caution),
        rule(r"\b(mkdir|touch|cp|copy)\b", Caution),
        rule(r"\bgit\s+config\b", Caution),
    ]
});

/// Assigns safety tiers and derives revert commands. Pure text analysis:
/// never spawns a process, never errors on well-formed text.
#[derive(Debug, Clone)]
pub struct Classifier {
    host: HostInfo,
}

impl Classifier {
    #[must_use]
    pub fn new(host: HostInfo) -> Self {
        Self { host }
    }

    #[must_use]
    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    /// Classify one raw command line.
    ///
    /// Empty or unparseable input classifies `Dangerous` with no revert: the
    /// gate will then require confirmation rather than letting an oddity
    /// through unexamined.
    #[must_use]
    pub fn classify(&self, raw: &str) -> Classification {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Classification {
                safety_level: SafetyLevel::Dangerous,
                requires_sudo: false,
                revert: None,
            };
        }

        let safety_level = RULES
            .iter()
            .find(|r| r.pattern.is_match(&normalized))
            .map_or(SafetyLevel::Safe, |r| r.level);

        let requires_sudo = self.requires_elevation(&normalized);

        let revert = if safety_level == SafetyLevel::Dangerous {
            None
        } else {
            revert_command(raw)
        };

        Classification {
            safety_level,
            requires_sudo,
            revert,
        }
    }

    /// Re-classify a planner- or model-produced command, overriding its
    /// advisory metadata. The incoming hints are never trusted.
    #[must_use]
    pub fn annotate(&self, mut command: Command) -> Command {
        let c = self.classify(&command.text);
        command.safety_level = c.safety_level;
        command.requires_sudo = c.requires_sudo;
        command.revert = c.revert;
        command
    }

    /// True when any word in the command is a recognized elevation wrapper
    /// for this platform. Word match, so `sudoku` does not count.
    fn requires_elevation(&self, normalized: &str) -> bool {
        normalized
            .split_whitespace()
            .any(|token| self.host.elevation_prefixes().contains(&token))
    }
}

/// Lowercase and collapse runs of whitespace so rule patterns see a canonical
/// form regardless of how the command was typed.
fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
