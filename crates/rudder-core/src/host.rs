use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Operating-system family, coarse enough to pick command dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Linux,
    Macos,
    Windows,
    Unknown,
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Immutable snapshot of the host platform, computed once per process and
/// passed explicitly so tests can inject arbitrary platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub os: OsKind,
    pub name: String,
    pub arch: String,
    /// Shell basename, e.g. `bash`, `zsh`, `cmd`.
    pub shell: String,
    pub package_manager: Option<String>,
    pub firewall_tool: Option<String>,
}

impl HostInfo {
    /// Detect the current host. Probes `$SHELL` and `$PATH` only; no
    /// subprocesses are spawned.
    #[must_use]
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "linux" => OsKind::Linux,
            "macos" => OsKind::Macos,
            "windows" => OsKind::Windows,
            _ => OsKind::Unknown,
        };

        let (shell, package_manager, firewall_tool) = match os {
            OsKind::Linux => (
                unix_shell(),
                first_in_path(&["apt", "dnf", "pacman", "yum", "zypper", "emerge"]),
                first_in_path(&["ufw", "nft", "iptables"]),
            ),
            OsKind::Macos => (
                unix_shell(),
                first_in_path(&["brew"]),
                Some("pfctl".to_owned()),
            ),
            OsKind::Windows => (
                windows_shell(),
                first_in_path(&["winget", "choco", "scoop"]),
                Some("netsh".to_owned()),
            ),
            OsKind::Unknown => ("sh".to_owned(), None, None),
        };

        Self {
            os,
            name: std::env::consts::OS.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
            shell,
            package_manager,
            firewall_tool,
        }
    }

    /// Fixed Linux snapshot for tests and non-interactive tooling.
    #[must_use]
    pub fn linux_defaults() -> Self {
        Self {
            os: OsKind::Linux,
            name: "linux".into(),
            arch: "x86_64".into(),
            shell: "bash".into(),
            package_manager: Some("apt".into()),
            firewall_tool: Some("ufw".into()),
        }
    }

    /// Program + flag used to hand a command line to the host shell.
    #[must_use]
    pub fn shell_invocation(&self) -> (&'static str, &'static str) {
        match self.os {
            OsKind::Windows => ("cmd", "/C"),
            _ => ("sh", "-c"),
        }
    }

    /// Elevation wrappers recognized on this platform.
    #[must_use]
    pub fn elevation_prefixes(&self) -> &'static [&'static str] {
        match self.os {
            OsKind::Windows => &["runas", "sudo"],
            _ => &["sudo", "doas"],
        }
    }
}

fn unix_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .and_then(|s| s.rsplit('/').next().map(str::to_owned))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "sh".to_owned())
}

fn windows_shell() -> String {
    first_in_path(&["pwsh", "powershell"]).unwrap_or_else(|| "cmd".to_owned())
}

/// First of `names` found as an executable file on `$PATH`.
fn first_in_path(names: &[&str]) -> Option<String> {
    let path = std::env::var_os("PATH")?;
    let dirs: Vec<_> = std::env::split_paths(&path).collect();
    for name in names {
        for dir in &dirs {
            if is_executable(&dir.join(name)) {
                return Some((*name).to_owned());
            }
            #[cfg(windows)]
            if is_executable(&dir.join(format!("{name}.exe"))) {
                return Some((*name).to_owned());
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn detect_reports_current_os() {
        let host = HostInfo::detect();
        #[cfg(target_os = "linux")]
        assert_eq!(host.os, OsKind::Linux);
        #[cfg(target_os = "macos")]
        assert_eq!(host.os, OsKind::Macos);
        assert!(!host.arch.is_empty());
        assert!(!host.shell.is_empty());
    }

    #[test]
    fn linux_defaults_snapshot() {
        let host = HostInfo::linux_defaults();
        assert_eq!(host.os, OsKind::Linux);
        assert_eq!(host.shell, "bash");
        assert_eq!(host.package_manager.as_deref(), Some("apt"));
        assert_eq!(host.firewall_tool.as_deref(), Some("ufw"));
    }

    #[test]
    fn shell_invocation_per_os() {
        let mut host = HostInfo::linux_defaults();
        assert_eq!(host.shell_invocation(), ("sh", "-c"));
        host.os = OsKind::Windows;
        assert_eq!(host.shell_invocation(), ("cmd", "/C"));
    }

    #[test]
    fn elevation_prefixes_per_os() {
        let mut host = HostInfo::linux_defaults();
        assert_eq!(host.elevation_prefixes(), &["sudo", "doas"]);
        host.os = OsKind::Windows;
        assert!(host.elevation_prefixes().contains(&"runas"));
    }

    #[test]
    fn os_kind_display() {
        assert_eq!(OsKind::Linux.to_string(), "linux");
        assert_eq!(OsKind::Macos.to_string(), "macos");
        assert_eq!(OsKind::Windows.to_string(), "windows");
        assert_eq!(OsKind::Unknown.to_string(), "unknown");
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn unix_shell_reads_env() {
        let old = std::env::var_os("SHELL");
        unsafe { std::env::set_var("SHELL", "/usr/bin/zsh") };
        assert_eq!(unix_shell(), "zsh");
        match old {
            Some(v) => unsafe { std::env::set_var("SHELL", v) },
            None => unsafe { std::env::remove_var("SHELL") },
        }
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn unix_shell_falls_back_to_sh() {
        let old = std::env::var_os("SHELL");
        unsafe { std::env::remove_var("SHELL") };
        assert_eq!(unix_shell(), "sh");
        if let Some(v) = old {
            unsafe { std::env::set_var("SHELL", v) };
        }
    }

    #[cfg(unix)]
    #[test]
    fn first_in_path_finds_sh() {
        // /bin/sh or /usr/bin/sh exists on any unix test host
        assert_eq!(first_in_path(&["sh"]).as_deref(), Some("sh"));
    }

    #[test]
    fn first_in_path_misses_unknown_binary() {
        assert!(first_in_path(&["rudder-test-no-such-binary-xyz"]).is_none());
    }

    #[test]
    fn first_in_path_respects_order() {
        // both exist on unix; "sh" listed first must win
        #[cfg(unix)]
        assert_eq!(first_in_path(&["sh", "ls"]).as_deref(), Some("sh"));
    }

    #[test]
    fn host_serde_round_trip() {
        let host = HostInfo::linux_defaults();
        let json = serde_json::to_string(&host).unwrap();
        let back: HostInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, host);
    }
}
