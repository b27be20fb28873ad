//! Syntactic inverse derivation.
//!
//! A revert is computed by pure text transformation from a small template
//! table. If the inverse cannot be derived from the command text alone, no
//! revert is produced; guessing is worse than admitting there is none.

/// Units whose stop direction amounts to disabling a firewall; their inverse
/// is never offered.
const GUARDED_UNITS: &[&str] = &["nftables", "iptables", "firewalld"];

/// Derive the inverse of `raw`, when one exists in the template table.
///
/// Covered templates: `mkdir` ↔ `rmdir` (bare, no flags), `mv a b` → `mv b a`
/// (exactly two plain operands), `systemctl start` ↔ `stop` for ordinary
/// units, and `git config key value` → `git config --unset key`. An
/// elevation prefix (`sudo`/`doas`) is carried over to the inverse.
#[must_use]
pub fn revert_command(raw: &str) -> Option<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let (prefix, rest) = match tokens.split_first() {
        Some((&first, rest)) if matches!(first, "sudo" | "doas") => (Some(first), rest),
        _ => (None, tokens.as_slice()),
    };

    let inverse = match rest {
        ["mkdir", dirs @ ..] if plain_operands(dirs) => Some(format!("rmdir {}", dirs.join(" "))),
        ["rmdir", dirs @ ..] if plain_operands(dirs) => Some(format!("mkdir {}", dirs.join(" "))),
        ["mv", a, b] if plain(a) && plain(b) => Some(format!("mv {b} {a}")),
        ["systemctl", "start", unit] if plain(unit) && !GUARDED_UNITS.contains(unit) => {
            Some(format!("systemctl stop {unit}"))
        }
        ["systemctl", "stop", unit] if plain(unit) && !GUARDED_UNITS.contains(unit) => {
            Some(format!("systemctl start {unit}"))
        }
        ["git", "config", key, _value] if plain(key) => Some(format!("git config --unset {key}")),
        _ => None,
    };

    inverse.map(|inv| match prefix {
        Some(p) => format!("{p} {inv}"),
        None => inv,
    })
}

/// A token that can be echoed back into a generated command verbatim: not a
/// flag, no globs, no shell metacharacters.
fn plain(token: &str) -> bool {
    !token.is_empty()
        && !token.starts_with('-')
        && !token.contains(['*', '?', '[', ']', ';', '|', '&', '<', '>', '$', '`', '"', '\''])
}

fn plain_operands(tokens: &[&str]) -> bool {
    !tokens.is_empty() && tokens.iter().all(|t| plain(t))
}
