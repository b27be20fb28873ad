//! Rule-based prompt-to-plan fallback.
//!
//! Maps a natural-language request to a small command plan using keyword
//! rules and the host snapshot. Safety hints attached here are advisory; the
//! runner re-classifies every command before gating.

use std::sync::LazyLock;

use regex::Regex;

use rudder_core::{Command, HostInfo, OsKind, SafetyLevel};

static PING_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ping\s+([a-z0-9][a-z0-9.:-]*)").expect("static pattern"));

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:install|remove|uninstall)\s+(?:the\s+)?(?:package\s+)?([a-z0-9][a-z0-9._+-]*)")
        .expect("static pattern")
});

static SERVICE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:start|stop|restart)\s+(?:the\s+)?([a-z0-9][a-z0-9._-]*)(?:\s+service)?")
        .expect("static pattern")
});

static DIR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:directory|folder)\s+(?:named\s+|called\s+)?([a-z0-9][a-z0-9._/-]*)")
        .expect("static pattern")
});

static FILE_KIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"find\s+(?:all\s+)?([a-z0-9]+)\s+files").expect("static pattern"));

/// Map a prompt to a plan. Empty when no rule matches; the caller decides how
/// to report that.
#[must_use]
pub fn plan(prompt: &str, host: &HostInfo) -> Vec<Command> {
    let p = prompt.to_lowercase();
    let windows = host.os == OsKind::Windows;

    let command = if p.contains("list files") || p.contains("show files") {
        Some(if windows {
            Command::new("dir").with_explanation("list files in the current directory")
        } else {
            Command::new("ls -la").with_explanation("list files in the current directory")
        })
    } else if p.contains("current directory") || p.contains("where am i") {
        Some(if windows {
            Command::new("cd").with_explanation("print the current directory")
        } else {
            Command::new("pwd").with_explanation("print the current directory")
        })
    } else if p.contains("disk space") || p.contains("disk usage") {
        Some(if windows {
            Command::new("wmic logicaldisk get size,freespace,caption")
                .with_explanation("show free disk space per drive")
        } else {
            Command::new("df -h").with_explanation("show disk usage per filesystem")
        })
    } else if p.contains("processes") {
        Some(if windows {
            Command::new("tasklist").with_explanation("list running processes")
        } else {
            Command::new("ps aux").with_explanation("list running processes")
        })
    } else if let Some(target) = PING_TARGET.captures(&p).map(|c| c[1].to_owned()) {
        let flag = if windows { "-n" } else { "-c" };
        Some(
            Command::new(format!("ping {flag} 4 {target}"))
                .with_explanation(format!("send four pings to {target}")),
        )
    } else if let Some(kind) = FILE_KIND.captures(&p).map(|c| c[1].to_owned()) {
        Some(find_files(&kind, windows))
    } else if (p.contains("make") || p.contains("create"))
        && (p.contains("directory") || p.contains("folder"))
    {
        DIR_NAME.captures(&p).map(|c| {
            let name = &c[1];
            let mut cmd = Command::new(format!("mkdir {name}"))
                .with_explanation(format!("create directory {name}"));
            cmd.safety_level = SafetyLevel::Caution;
            cmd
        })
    } else if p.contains("uninstall") || p.contains("remove") {
        package_command(host, "remove", &p)
    } else if p.contains("install") {
        package_command(host, "install", &p)
    } else if p.contains("update") && p.contains("package") {
        package_update(host)
    } else if p.contains("firewall") {
        firewall_command(host, &p)
    } else if p.contains("start") || p.contains("stop") || p.contains("restart") {
        service_command(host, &p)
    } else {
        None
    };

    command
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            #[allow(clippy::cast_possible_truncation)]
            let step = (i + 1) as u32;
            c.with_step(step)
        })
        .collect()
}

fn find_files(kind: &str, windows: bool) -> Command {
    let ext = match kind {
        "python" => "py",
        "rust" => "rs",
        "text" => "txt",
        "markdown" => "md",
        other => other,
    };
    if windows {
        Command::new(format!("dir /s /b *.{ext}"))
            .with_explanation(format!("find {kind} files under the current directory"))
    } else {
        Command::new(format!("find . -name '*.{ext}'"))
            .with_explanation(format!("find {kind} files under the current directory"))
    }
}

fn package_command(host: &HostInfo, verb: &str, prompt: &str) -> Option<Command> {
    let package = PACKAGE_NAME.captures(prompt).map(|c| c[1].to_owned())?;
    let manager = host.package_manager.as_deref()?;
    let text = match manager {
        "brew" => format!("brew {verb} {package}"),
        "winget" | "choco" | "scoop" => {
            let verb = if verb == "remove" { "uninstall" } else { verb };
            format!("{manager} {verb} {package}")
        }
        "pacman" => {
            let flag = if verb == "remove" { "-R" } else { "-S" };
            format!("sudo pacman {flag} {package}")
        }
        _ => format!("sudo {manager} {verb} {package}"),
    };
    let mut cmd =
        Command::new(text).with_explanation(format!("{verb} {package} via {manager}"));
    cmd.safety_level = SafetyLevel::Caution;
    Some(cmd)
}

fn package_update(host: &HostInfo) -> Option<Command> {
    let manager = host.package_manager.as_deref()?;
    let text = match manager {
        "brew" => "brew update".to_owned(),
        "pacman" => "sudo pacman -Syu".to_owned(),
        "winget" => "winget upgrade --all".to_owned(),
        _ => format!("sudo {manager} update"),
    };
    let mut cmd = Command::new(text).with_explanation("refresh the package index");
    cmd.safety_level = SafetyLevel::Caution;
    Some(cmd)
}

fn firewall_command(host: &HostInfo, prompt: &str) -> Option<Command> {
    let tool = host.firewall_tool.as_deref()?;
    let action = if prompt.contains("disable") || prompt.contains("turn off") {
        "disable"
    } else if prompt.contains("enable") || prompt.contains("turn on") {
        "enable"
    } else {
        "status"
    };
    let text = match (tool, action) {
        ("ufw", a) => format!("sudo ufw {a}"),
        ("pfctl", "enable") => "sudo pfctl -e".to_owned(),
        ("pfctl", "disable") => "sudo pfctl -d".to_owned(),
        ("pfctl", _) => "sudo pfctl -s info".to_owned(),
        ("netsh", "enable") => "netsh advfirewall set allprofiles state on".to_owned(),
        ("netsh", "disable") => "netsh advfirewall set allprofiles state off".to_owned(),
        ("netsh", _) => "netsh advfirewall show allprofiles".to_owned(),
        (t, "status") => format!("sudo {t} -L"),
        (t, a) => format!("sudo {t} {a}"),
    };
    let mut cmd = Command::new(text).with_explanation(format!("{action} the {tool} firewall"));
    cmd.safety_level = SafetyLevel::Caution;
    Some(cmd)
}

fn service_command(host: &HostInfo, prompt: &str) -> Option<Command> {
    let captures = SERVICE_NAME.captures(prompt)?;
    let unit = captures[1].to_owned();
    if !prompt.contains("service") {
        return None;
    }
    let verb = if prompt.contains("restart") {
        "restart"
    } else if prompt.contains("stop") {
        "stop"
    } else {
        "start"
    };
    let text = match host.os {
        OsKind::Windows => format!("sc {verb} {unit}"),
        OsKind::Macos => format!("sudo launchctl {verb} {unit}"),
        _ => format!("sudo systemctl {verb} {unit}"),
    };
    let mut cmd = Command::new(text).with_explanation(format!("{verb} the {unit} service"));
    cmd.safety_level = SafetyLevel::Caution;
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> HostInfo {
        HostInfo::linux_defaults()
    }

    fn windows() -> HostInfo {
        let mut host = HostInfo::linux_defaults();
        host.os = OsKind::Windows;
        host.package_manager = Some("winget".into());
        host.firewall_tool = Some("netsh".into());
        host
    }

    fn first(prompt: &str, host: &HostInfo) -> Command {
        let mut commands = plan(prompt, host);
        assert!(!commands.is_empty(), "no plan for {prompt:?}");
        commands.remove(0)
    }

    #[test]
    fn list_files() {
        assert_eq!(first("list files in current directory", &linux()).text, "ls -la");
        assert_eq!(first("list files", &windows()).text, "dir");
    }

    #[test]
    fn current_directory() {
        assert_eq!(first("show current directory", &linux()).text, "pwd");
        assert_eq!(first("where am i", &windows()).text, "cd");
    }

    #[test]
    fn ping_extracts_target() {
        let cmd = first("ping google.com", &linux());
        assert_eq!(cmd.text, "ping -c 4 google.com");
        let cmd = first("ping google.com", &windows());
        assert_eq!(cmd.text, "ping -n 4 google.com");
    }

    #[test]
    fn find_python_files() {
        assert_eq!(first("find python files", &linux()).text, "find . -name '*.py'");
        assert_eq!(first("find all rust files", &linux()).text, "find . -name '*.rs'");
    }

    #[test]
    fn install_uses_host_package_manager() {
        let cmd = first("install curl", &linux());
        assert_eq!(cmd.text, "sudo apt install curl");
        assert_eq!(cmd.safety_level, SafetyLevel::Caution);

        let mut host = linux();
        host.package_manager = Some("pacman".into());
        assert_eq!(first("install vim", &host).text, "sudo pacman -S vim");

        let mut host = linux();
        host.os = OsKind::Macos;
        host.package_manager = Some("brew".into());
        assert_eq!(first("install jq", &host).text, "brew install jq");

        assert_eq!(first("install ripgrep", &windows()).text, "winget install ripgrep");
    }

    #[test]
    fn remove_package() {
        assert_eq!(first("remove curl", &linux()).text, "sudo apt remove curl");
        assert_eq!(first("uninstall ripgrep", &windows()).text, "winget uninstall ripgrep");
    }

    #[test]
    fn no_package_manager_yields_no_plan() {
        let mut host = linux();
        host.package_manager = None;
        assert!(plan("install curl", &host).is_empty());
    }

    #[test]
    fn firewall_per_host_tool() {
        assert_eq!(first("enable the firewall", &linux()).text, "sudo ufw enable");
        assert_eq!(first("firewall status", &linux()).text, "sudo ufw status");
        assert_eq!(
            first("disable the firewall", &windows()).text,
            "netsh advfirewall set allprofiles state off"
        );
    }

    #[test]
    fn service_control() {
        assert_eq!(
            first("restart the nginx service", &linux()).text,
            "sudo systemctl restart nginx"
        );
        assert_eq!(first("stop the spooler service", &windows()).text, "sc stop spooler");
    }

    #[test]
    fn start_without_service_keyword_is_unmapped() {
        assert!(plan("start the show", &linux()).is_empty());
    }

    #[test]
    fn create_directory() {
        let cmd = first("create a folder called demo", &linux());
        assert_eq!(cmd.text, "mkdir demo");
    }

    #[test]
    fn unmapped_prompt_yields_empty_plan() {
        assert!(plan("compose a sonnet about the sea", &linux()).is_empty());
        assert!(plan("", &linux()).is_empty());
    }

    #[test]
    fn steps_are_numbered() {
        assert_eq!(first("list files", &linux()).step, Some(1));
    }
}
