//! Recurring job registration
//!
//! Windows uses Task Scheduler through PowerShell; Linux rewrites the user's
//! crontab. Both go through the [`Runner`], so dry-run only logs the commands.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use installthecli_core::types::AttemptResult;
use installthecli_core::Result;
use installthecli_engine::{CommandSpec, Runner};
use tracing::{debug, info, warn};

use crate::procedure::ScriptFlavor;
use crate::schedule::RecurringSchedule;

/// Marker line opening the managed crontab block
pub const CRON_BLOCK_BEGIN: &str = "# installthecli-auto-update";

/// Marker line closing the managed crontab block
pub const CRON_BLOCK_END: &str = "# installthecli-auto-update end";

/// Registers the update procedure with the platform's recurring-task facility
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Facility name for logs
    fn name(&self) -> &'static str;

    /// Register (or replace) the recurring job that runs `script`
    ///
    /// A failed registration command is reported on the returned attempt.
    async fn register(
        &self,
        runner: &Runner,
        schedule: &RecurringSchedule,
        script: &Utf8Path,
    ) -> Result<AttemptResult>;
}

/// Windows Task Scheduler
#[derive(Debug, Clone)]
pub struct WindowsTaskScheduler {
    task_name: String,
}

impl WindowsTaskScheduler {
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
        }
    }
}

#[async_trait]
impl Scheduler for WindowsTaskScheduler {
    fn name(&self) -> &'static str {
        "Task Scheduler"
    }

    async fn register(
        &self,
        runner: &Runner,
        schedule: &RecurringSchedule,
        script: &Utf8Path,
    ) -> Result<AttemptResult> {
        info!(
            "Registering scheduled task '{}' ({})",
            self.task_name,
            schedule.describe()
        );
        let command = render_task_registration(&self.task_name, schedule, script);
        let spec = CommandSpec::new("powershell").args([
            "-NoProfile",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            command.as_str(),
        ]);
        Ok(runner.run(&self.task_name, &spec).await)
    }
}

/// PowerShell that registers the hidden, limited-privilege update task
pub fn render_task_registration(
    task_name: &str,
    schedule: &RecurringSchedule,
    script: &Utf8Path,
) -> String {
    let quote = |v: &str| ScriptFlavor::PowerShell.quote(v);
    let action_args = format!(
        "-NoProfile -ExecutionPolicy Bypass -WindowStyle Hidden -File \"{}\"",
        script
    );

    let mut lines = vec![
        "$currentUser = [System.Security.Principal.WindowsIdentity]::GetCurrent().Name".to_string(),
        format!(
            "$action = New-ScheduledTaskAction -Execute 'powershell.exe' -Argument {}",
            quote(&action_args)
        ),
    ];
    let mut triggers = Vec::new();
    if schedule.at_boot {
        lines.push("$triggerStartup = New-ScheduledTaskTrigger -AtStartup".to_string());
        triggers.push("$triggerStartup");
    }
    if schedule.at_logon {
        lines.push("$triggerLogon = New-ScheduledTaskTrigger -AtLogOn".to_string());
        triggers.push("$triggerLogon");
    }
    lines.push(format!(
        "$triggerDaily = New-ScheduledTaskTrigger -Daily -At {}",
        quote(&schedule.daily_hhmm())
    ));
    triggers.push("$triggerDaily");
    lines.push(
        "$settings = New-ScheduledTaskSettingsSet -Hidden -StartWhenAvailable \
         -AllowStartIfOnBatteries -DontStopIfGoingOnBatteries"
            .to_string(),
    );
    lines.push(
        "$principal = New-ScheduledTaskPrincipal -UserId $currentUser -LogonType Interactive \
         -RunLevel Limited"
            .to_string(),
    );
    lines.push(format!(
        "Register-ScheduledTask -TaskName {} -Action $action -Trigger @({}) -Settings $settings \
         -Principal $principal -Description {} -Force | Out-Null",
        quote(task_name),
        triggers.join(", "),
        quote(&format!(
            "Hidden AI CLI auto-update ({}) created by InstallTheCli.",
            schedule.describe()
        ))
    ));
    lines.join("; ")
}

/// User crontab
#[derive(Debug, Clone)]
pub struct CronScheduler {
    staging_dir: Utf8PathBuf,
}

impl CronScheduler {
    /// Scheduler staging the new crontab under `staging_dir`
    pub fn new(staging_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }
}

#[async_trait]
impl Scheduler for CronScheduler {
    fn name(&self) -> &'static str {
        "cron"
    }

    async fn register(
        &self,
        runner: &Runner,
        schedule: &RecurringSchedule,
        script: &Utf8Path,
    ) -> Result<AttemptResult> {
        if schedule.at_logon {
            info!("cron has no logon trigger; the logon run is covered by @reboot");
        }

        let existing = match runner.query(&CommandSpec::new("crontab").arg("-l")).await {
            Some(output) if output.success() => output.stdout,
            _ => {
                debug!("No existing crontab");
                String::new()
            }
        };
        let updated = render_crontab(&existing, schedule, script);

        let staged = self.staging_dir.join("installthecli.crontab");
        if runner.is_dry_run() {
            info!("[dry-run] would install crontab:\n{}", updated.trim_end());
        } else {
            std::fs::create_dir_all(&self.staging_dir)?;
            std::fs::write(&staged, &updated)?;
        }

        info!("Registering cron entries ({})", schedule.describe());
        Ok(runner
            .run("crontab", &CommandSpec::new("crontab").arg(staged.as_str()))
            .await)
    }
}

/// Replace the managed block in `existing` with entries for `schedule`
///
/// Lines outside the block are kept in order. A block missing its end
/// marker only loses the lines that run the update script. A logon trigger
/// maps to `@reboot`, the closest cron equivalent.
pub fn render_crontab(existing: &str, schedule: &RecurringSchedule, script: &Utf8Path) -> String {
    let mut kept = Vec::new();
    let mut block = Vec::new();
    let mut in_block = false;
    for line in existing.lines() {
        match line.trim() {
            CRON_BLOCK_BEGIN => in_block = true,
            CRON_BLOCK_END => {
                in_block = false;
                block.clear();
            }
            _ if !in_block => kept.push(line),
            _ => block.push(line),
        }
    }
    if in_block {
        warn!("Crontab block '{}' has no end marker", CRON_BLOCK_BEGIN);
        let script_name = script.file_name().unwrap_or(script.as_str());
        kept.extend(block.into_iter().filter(|l| !l.contains(script_name)));
    }
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    let quote = |v: &str| ScriptFlavor::Posix.quote(v);
    let log = script.with_file_name("auto_update.log");
    let job = format!(
        "/bin/sh {} >> {} 2>&1",
        quote(script.as_str()),
        quote(log.as_str())
    );

    let mut out: Vec<String> = kept.iter().map(|l| l.to_string()).collect();
    if !out.is_empty() {
        out.push(String::new());
    }
    out.push(CRON_BLOCK_BEGIN.to_string());
    if schedule.at_boot || schedule.at_logon {
        out.push(format!("@reboot {}", job));
    }
    out.push(format!("{} * * * {}", schedule.cron_minute_hour(), job));
    out.push(CRON_BLOCK_END.to_string());

    let mut text = out.join("\n");
    text.push('\n');
    text
}
