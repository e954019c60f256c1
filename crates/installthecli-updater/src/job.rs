//! The background update job: procedure, schedule and registration

use camino::{Utf8Path, Utf8PathBuf};
use installthecli_core::platform::{Platform, PlatformInfo};
use installthecli_core::types::{AttemptResult, UpdateConfig};
use installthecli_core::{Catalog, Error, Result};
use installthecli_engine::Runner;
use serde::Serialize;
use tracing::{info, warn};

use crate::procedure::{render_update_procedure, UpdateProcedure};
use crate::schedule::RecurringSchedule;
use crate::scheduler::{CronScheduler, Scheduler, WindowsTaskScheduler};

/// Rendered procedure plus its schedule, ready to register
#[derive(Debug, Clone, Serialize)]
pub struct UpdaterJob {
    task_name: String,
    procedure: UpdateProcedure,
    schedule: RecurringSchedule,
}

/// Result of registering the job
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    /// Where the procedure lives
    pub script_path: Utf8PathBuf,

    /// False in dry-run
    pub script_written: bool,

    /// The scheduler command
    pub attempt: AttemptResult,
}

impl Registration {
    /// True when the scheduler accepted the job
    pub fn succeeded(&self) -> bool {
        self.attempt.succeeded
    }
}

impl UpdaterJob {
    /// Render the procedure for `platform` from `catalog`
    pub fn generate(
        catalog: &Catalog,
        platform: &PlatformInfo,
        config: &UpdateConfig,
    ) -> Result<Self> {
        let schedule = RecurringSchedule::from_config(config)?;
        let procedure = render_update_procedure(catalog, platform.os, &config.task_name)?;
        Ok(Self {
            task_name: config.task_name.clone(),
            procedure,
            schedule,
        })
    }

    /// The rendered procedure
    pub fn procedure(&self) -> &UpdateProcedure {
        &self.procedure
    }

    /// The recurring schedule
    pub fn schedule(&self) -> &RecurringSchedule {
        &self.schedule
    }

    /// Where the procedure is saved under `state_dir`
    pub fn script_path(&self, state_dir: &Utf8Path) -> Utf8PathBuf {
        state_dir.join(self.procedure.flavor.file_name())
    }

    /// Scheduler matching this job's platform
    pub fn scheduler_for(
        &self,
        platform: &PlatformInfo,
        state_dir: &Utf8Path,
    ) -> Result<Box<dyn Scheduler>> {
        match platform.os {
            Platform::Windows => Ok(Box::new(WindowsTaskScheduler::new(&self.task_name))),
            Platform::Linux(_) => Ok(Box::new(CronScheduler::new(state_dir))),
            other => Err(Error::unsupported_environment(format!(
                "no recurring-task facility for {}",
                other
            ))),
        }
    }

    /// Save the procedure under `state_dir` and register it with `scheduler`
    ///
    /// In dry-run nothing is written and the scheduler command is only logged.
    pub async fn register(
        &self,
        runner: &Runner,
        scheduler: &dyn Scheduler,
        state_dir: &Utf8Path,
    ) -> Result<Registration> {
        let script_path = self.script_path(state_dir);

        let script_written = if runner.is_dry_run() {
            info!("[dry-run] would write update procedure to {}", script_path);
            false
        } else {
            std::fs::create_dir_all(state_dir)?;
            std::fs::write(&script_path, &self.procedure.content)?;
            make_executable(&script_path)?;
            info!("Wrote update procedure to {}", script_path);
            true
        };

        let attempt = scheduler
            .register(runner, &self.schedule, &script_path)
            .await?;
        if attempt.succeeded {
            info!(
                "Auto-update registered with {} ({})",
                scheduler.name(),
                self.schedule.describe()
            );
        } else {
            warn!(
                "Could not register auto-update with {}: {}",
                scheduler.name(),
                attempt.failure_summary()
            );
        }

        Ok(Registration {
            script_path,
            script_written,
            attempt,
        })
    }
}

#[cfg(unix)]
fn make_executable(path: &Utf8Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Utf8Path) -> Result<()> {
    Ok(())
}
