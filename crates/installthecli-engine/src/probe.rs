//! Version probing for interpreters and runtimes

use std::sync::LazyLock;

use installthecli_core::types::ProbeCommand;
use regex::Regex;
use semver::Version;
use tracing::debug;

use crate::runner::{CommandSpec, Runner};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?)").expect("version regex is valid"));

/// Extract the first version number from `--version` style output
///
/// Two-component versions ("3.12") are padded to "3.12.0".
pub fn parse_version(text: &str) -> Option<Version> {
    let raw = VERSION_RE.captures(text)?.get(1)?.as_str();
    let normalized = if raw.matches('.').count() == 1 {
        format!("{}.0", raw)
    } else {
        raw.to_string()
    };
    Version::parse(&normalized).ok()
}

/// Whether `version` satisfies an optional floor
pub fn meets_floor(version: &Version, floor: Option<&Version>) -> bool {
    match floor {
        Some(floor) => version >= floor,
        None => true,
    }
}

/// Spec for `<command> <prefix args> <args>`
pub fn command_with(command: &ProbeCommand, args: &[&str]) -> CommandSpec {
    CommandSpec::new(&command.program)
        .args(command.prefix_args.iter().cloned())
        .args(args.iter().copied())
}

/// Run `<command> --version` and parse the result
///
/// Older Pythons print the version on stderr, so both streams are read.
pub async fn probe_version(runner: &Runner, command: &ProbeCommand) -> Option<Version> {
    let output = runner.query(&command_with(command, &["--version"])).await?;
    if !output.success() {
        debug!("{} --version exited with {:?}", command, output.exit_code);
        return None;
    }
    let version = parse_version(&output.combined());
    debug!("{} reports version {:?}", command, version);
    version
}
