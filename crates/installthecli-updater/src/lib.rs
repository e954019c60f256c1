//! Background auto-update for InstallTheCli
//!
//! This crate handles:
//! - The recurring schedule (boot, logon, daily)
//! - Rendering the standalone update procedure from the catalog
//! - Registering it with Task Scheduler (Windows) or cron (Linux)

pub mod job;
pub mod procedure;
pub mod schedule;
pub mod scheduler;

pub use job::{Registration, UpdaterJob};
pub use procedure::{render_update_procedure, ProcedureRenderer, ScriptFlavor, UpdateProcedure};
pub use schedule::RecurringSchedule;
pub use scheduler::{CronScheduler, Scheduler, WindowsTaskScheduler};
