//! Doctor command - read-only report of the machine's install readiness
//!
//! Shows the detected platform, the package tools found, whether commands
//! would run elevated, and what each shared prerequisite currently resolves
//! to. Nothing is installed.

use anyhow::Result;
use installthecli_core::platform::Platform;
use installthecli_core::types::PrerequisiteKey;
use installthecli_engine::CommandSpec;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::output;

#[derive(Debug, Serialize)]
struct DoctorReport {
    platform: String,
    arch: String,
    supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unsupported_reason: Option<String>,
    elevated: Option<bool>,
    tools: Vec<ToolCheck>,
    prerequisites: Vec<PrerequisiteCheck>,
}

#[derive(Debug, Serialize, Tabled)]
struct ToolCheck {
    tool: String,
    #[tabled(display = "display_path")]
    path: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct PrerequisiteCheck {
    prerequisite: PrerequisiteKey,
    required: String,
    #[tabled(display = "display_found")]
    found: bool,
    #[tabled(display = "display_path")]
    command: Option<String>,
    #[tabled(display = "display_path")]
    version: Option<String>,
}

fn display_path(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn display_found(found: &bool) -> String {
    let mark = if *found { "✓" } else { "✗" };
    mark.to_string()
}

/// Run the doctor diagnostic
pub async fn run(ctx: &Context) -> Result<()> {
    let report = diagnose(ctx).await;

    if ctx.json() {
        return output::json(&report);
    }

    output::header("Platform");
    output::kv("os", &report.platform);
    output::kv("arch", &report.arch);
    output::kv(
        "elevated",
        match report.elevated {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        },
    );
    match &report.unsupported_reason {
        None => output::success("Platform supported"),
        Some(reason) => output::error(reason),
    }

    output::header("Package tools");
    let mut table = Table::new(&report.tools);
    table.with(Style::sharp());
    println!("{}", table);

    output::header("Prerequisites");
    let mut table = Table::new(&report.prerequisites);
    table.with(Style::sharp());
    println!("{}", table);

    let missing = report.prerequisites.iter().filter(|p| !p.found).count();
    if missing == 0 {
        output::success("All prerequisites available");
    } else {
        output::info(&format!(
            "{} prerequisite(s) missing; install commands resolve them on demand",
            missing
        ));
    }
    Ok(())
}

async fn diagnose(ctx: &Context) -> DoctorReport {
    let unsupported_reason = ctx.platform.require_supported().err().map(|e| e.to_string());

    let mut tool_names: Vec<&str> = ctx
        .platform
        .package_managers
        .iter()
        .map(|pm| pm.command())
        .collect();
    tool_names.extend(["npm", "uv", "curl"]);
    tool_names.dedup();
    let tools = tool_names
        .into_iter()
        .map(|name| ToolCheck {
            tool: name.to_string(),
            path: ctx
                .locator
                .locate(name)
                .map(|p| p.display().to_string()),
        })
        .collect();

    let installer = ctx.installer();
    let mut prerequisites = Vec::new();
    for spec in ctx.catalog.prerequisites() {
        let resolved = installer.resolver().probe(spec.key).await;
        prerequisites.push(PrerequisiteCheck {
            prerequisite: spec.key,
            required: spec.constraint_display(),
            found: resolved.is_some(),
            command: resolved.as_ref().map(|r| match &r.path {
                Some(path) => path.display().to_string(),
                None => r.command.to_string(),
            }),
            version: resolved
                .as_ref()
                .and_then(|r| r.version.as_ref())
                .map(|v| v.to_string()),
        });
    }

    DoctorReport {
        platform: ctx.platform.os.to_string(),
        arch: ctx.platform.arch.to_string(),
        supported: unsupported_reason.is_none(),
        unsupported_reason,
        elevated: is_elevated(ctx).await,
        tools,
        prerequisites,
    }
}

async fn is_elevated(ctx: &Context) -> Option<bool> {
    match ctx.platform.os {
        Platform::Linux(_) => {
            let output = ctx.runner.query(&CommandSpec::new("whoami")).await?;
            output
                .success()
                .then(|| output.stdout.trim() == "root")
        }
        // `net session` only succeeds from an elevated prompt
        Platform::Windows => {
            let output = ctx
                .runner
                .query(&CommandSpec::new("net").arg("session"))
                .await?;
            Some(output.success())
        }
        _ => None,
    }
}
