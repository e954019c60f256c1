//! Platform detection module
//!
//! Detects the operating system, architecture, Linux distribution family and
//! the package managers available for installing prerequisites. Only Windows
//! and the Debian, Fedora and Arch Linux families are supported targets.

use std::collections::HashMap;
use std::fs;

use serde::Serialize;

use crate::error::{Error, Result};

/// Operating system platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Windows
    Windows,
    /// Linux with detected distribution family
    Linux(LinuxDistro),
    /// macOS (Darwin)
    MacOS,
    /// Unknown/unsupported platform
    Unknown,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "Windows"),
            Self::Linux(distro) => write!(f, "Linux/{}", distro),
            Self::MacOS => write!(f, "macOS"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Platform {
    /// True on Windows
    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }

    /// True on any Linux distribution
    pub fn is_linux(&self) -> bool {
        matches!(self, Self::Linux(_))
    }
}

/// Linux distribution family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinuxDistro {
    /// Debian-based (Debian, Ubuntu, Mint, Pop!_OS)
    Debian,
    /// Fedora-based (Fedora, RHEL, CentOS)
    Fedora,
    /// Arch-based (Arch Linux, Manjaro)
    Arch,
    /// Unknown distribution
    Unknown,
}

impl std::fmt::Display for LinuxDistro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debian => write!(f, "Debian"),
            Self::Fedora => write!(f, "Fedora"),
            Self::Arch => write!(f, "Arch"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl LinuxDistro {
    /// Package manager used for system packages on this family
    pub fn package_manager(&self) -> Option<PackageManager> {
        match self {
            Self::Debian => Some(PackageManager::Apt),
            Self::Fedora => Some(PackageManager::Dnf),
            Self::Arch => Some(PackageManager::Pacman),
            Self::Unknown => None,
        }
    }
}

/// CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arch {
    /// x86_64 / AMD64
    X86_64,
    /// ARM64 / AArch64
    Aarch64,
    /// Unknown architecture
    Unknown,
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::Aarch64 => write!(f, "aarch64"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Package managers the installer knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManager {
    /// APT (Debian/Ubuntu)
    Apt,
    /// DNF (Fedora)
    Dnf,
    /// Pacman (Arch)
    Pacman,
    /// Winget (Windows)
    Winget,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apt => write!(f, "APT"),
            Self::Dnf => write!(f, "DNF"),
            Self::Pacman => write!(f, "Pacman"),
            Self::Winget => write!(f, "Winget"),
        }
    }
}

impl PackageManager {
    /// Executable name
    pub fn command(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Winget => "winget",
        }
    }
}

/// Comprehensive platform information
#[derive(Debug, Clone, Serialize)]
pub struct PlatformInfo {
    /// Operating system
    pub os: Platform,
    /// CPU architecture
    pub arch: Arch,
    /// Package managers found on the search path
    pub package_managers: Vec<PackageManager>,
}

impl PlatformInfo {
    /// Build platform information for an explicit OS, without probing
    pub fn for_os(os: Platform) -> Self {
        let package_managers = match os {
            Platform::Windows => vec![PackageManager::Winget],
            Platform::Linux(distro) => distro.package_manager().into_iter().collect(),
            _ => Vec::new(),
        };
        Self {
            os,
            arch: detect_arch(),
            package_managers,
        }
    }

    /// Fail fast unless this is Windows or a supported Linux family
    pub fn require_supported(&self) -> Result<()> {
        match self.os {
            Platform::Windows => Ok(()),
            Platform::Linux(LinuxDistro::Unknown) => Err(Error::unsupported_environment(
                "unsupported Linux distribution. Supported families: Debian/Ubuntu, Fedora, Arch",
            )),
            Platform::Linux(_) => Ok(()),
            other => Err(Error::unsupported_environment(format!(
                "{} is not supported. Supported platforms: Windows, Linux",
                other
            ))),
        }
    }

    /// Argument vectors that install `packages` with the system package manager
    ///
    /// Linux commands are prefixed with `sudo` when `use_sudo` is set. Debian
    /// refreshes its package index first.
    pub fn system_install_commands(
        &self,
        packages: &[String],
        use_sudo: bool,
    ) -> Result<Vec<Vec<String>>> {
        let distro = match self.os {
            Platform::Linux(distro) => distro,
            other => {
                return Err(Error::unsupported_environment(format!(
                    "system packages cannot be installed on {}",
                    other
                )))
            }
        };

        let mut commands: Vec<Vec<String>> = match distro {
            LinuxDistro::Debian => vec![
                vec!["apt-get".into(), "update".into()],
                ["apt-get", "install", "-y"]
                    .iter()
                    .map(|s| s.to_string())
                    .chain(packages.iter().cloned())
                    .collect(),
            ],
            LinuxDistro::Fedora => vec![["dnf", "install", "-y"]
                .iter()
                .map(|s| s.to_string())
                .chain(packages.iter().cloned())
                .collect()],
            LinuxDistro::Arch => vec![["pacman", "-Sy", "--noconfirm"]
                .iter()
                .map(|s| s.to_string())
                .chain(packages.iter().cloned())
                .collect()],
            LinuxDistro::Unknown => {
                return Err(Error::unsupported_environment(
                    "unsupported Linux distribution. Supported families: Debian/Ubuntu, Fedora, Arch",
                ))
            }
        };

        if use_sudo {
            for argv in &mut commands {
                argv.insert(0, "sudo".to_string());
            }
        }
        Ok(commands)
    }
}

/// Detect the current platform
pub fn detect_platform() -> PlatformInfo {
    let os = detect_os();
    let arch = detect_arch();
    let package_managers = detect_package_managers(&os);

    PlatformInfo {
        os,
        arch,
        package_managers,
    }
}

fn detect_os() -> Platform {
    match std::env::consts::OS {
        "windows" => Platform::Windows,
        "linux" => Platform::Linux(detect_linux_distro()),
        "macos" => Platform::MacOS,
        _ => Platform::Unknown,
    }
}

fn detect_linux_distro() -> LinuxDistro {
    match fs::read_to_string("/etc/os-release") {
        Ok(content) => distro_from_os_release(&parse_os_release(&content)),
        Err(_) => LinuxDistro::Unknown,
    }
}

/// Parse `/etc/os-release` style `KEY=value` lines
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.to_string(), value.to_string())
        })
        .collect()
}

/// Classify a distribution family from its `ID` and `ID_LIKE` fields
pub fn distro_from_os_release(fields: &HashMap<String, String>) -> LinuxDistro {
    let haystack = ["ID", "ID_LIKE"]
        .iter()
        .filter_map(|k| fields.get(*k))
        .map(|v| v.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    if ["ubuntu", "debian"].iter().any(|t| haystack.contains(t)) {
        LinuxDistro::Debian
    } else if ["fedora", "rhel", "centos"]
        .iter()
        .any(|t| haystack.contains(t))
    {
        LinuxDistro::Fedora
    } else if haystack.contains("arch") {
        LinuxDistro::Arch
    } else {
        LinuxDistro::Unknown
    }
}

fn detect_arch() -> Arch {
    match std::env::consts::ARCH {
        "x86_64" => Arch::X86_64,
        "aarch64" => Arch::Aarch64,
        _ => Arch::Unknown,
    }
}

fn detect_package_managers(os: &Platform) -> Vec<PackageManager> {
    let candidates: &[PackageManager] = match os {
        Platform::Windows => &[PackageManager::Winget],
        Platform::Linux(_) => &[
            PackageManager::Apt,
            PackageManager::Dnf,
            PackageManager::Pacman,
        ],
        _ => &[],
    };

    candidates
        .iter()
        .copied()
        .filter(|pm| which::which(pm.command()).is_ok())
        .collect()
}
