//! Update procedure rendering
//!
//! The procedure is a standalone PowerShell or POSIX sh script generated from
//! the same catalog the installer uses, so install-time and update-time
//! candidate lists cannot drift. It re-detects every tool when it runs and
//! skips targets that are not installed.

use installthecli_core::platform::Platform;
use installthecli_core::types::{Backend, PackageManagerKind, PrerequisiteKey, Probe, TargetSpec};
use installthecli_core::{Catalog, Error, Result};
use installthecli_engine::backends::{NPM_QUIET_FLAGS, PIP_QUIET_FLAGS, WINGET_FLAGS};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

const POWERSHELL_TEMPLATE: &str = "update.ps1";
const POSIX_TEMPLATE: &str = "update.sh";

/// Script language of a rendered procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptFlavor {
    /// Windows PowerShell
    PowerShell,
    /// POSIX sh
    Posix,
}

impl ScriptFlavor {
    /// Flavor for `os`
    pub fn for_platform(os: Platform) -> Result<Self> {
        match os {
            Platform::Windows => Ok(Self::PowerShell),
            Platform::Linux(_) => Ok(Self::Posix),
            other => Err(Error::unsupported_environment(format!(
                "no update procedure for {}",
                other
            ))),
        }
    }

    /// File name the procedure is saved under
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PowerShell => "auto_update_clis.ps1",
            Self::Posix => "auto_update_clis.sh",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Self::PowerShell => POWERSHELL_TEMPLATE,
            Self::Posix => POSIX_TEMPLATE,
        }
    }

    /// Quote one word for this shell
    pub fn quote(&self, value: &str) -> String {
        match self {
            Self::PowerShell => format!("'{}'", value.replace('\'', "''")),
            Self::Posix => format!("'{}'", value.replace('\'', "'\\''")),
        }
    }

    /// Quote a list of words as array elements (PowerShell) or separate words (sh)
    fn quote_list(&self, values: &[String]) -> String {
        let quoted: Vec<String> = values.iter().map(|v| self.quote(v)).collect();
        match self {
            Self::PowerShell => quoted.join(", "),
            Self::Posix => quoted.join(" "),
        }
    }

    /// Flags kept together: an array for PowerShell, one word split at use for sh
    fn quote_flags(&self, flags: &[String]) -> String {
        match self {
            Self::PowerShell => self.quote_list(flags),
            Self::Posix => self.quote(&flags.join(" ")),
        }
    }
}

/// A rendered update procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateProcedure {
    /// Script language
    pub flavor: ScriptFlavor,

    /// Script text
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ScriptCommand {
    program: String,
    prefix_args: String,
}

#[derive(Debug, Serialize)]
struct ScriptTarget {
    key: String,
    label: String,
    kind: &'static str,
    candidates: String,
    commands: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct ProcedureContext {
    version: &'static str,
    task_name: String,
    npm_flags: String,
    pip_flags: String,
    winget_flags: String,
    pythons: Vec<ScriptCommand>,
    targets: Vec<ScriptTarget>,
}

/// Template registry for update procedures
pub struct ProcedureRenderer {
    tera: Tera,
}

impl ProcedureRenderer {
    /// Create a renderer with the embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(POWERSHELL_TEMPLATE, include_str!("templates/update.ps1.tera"))
            .map_err(template_error)?;
        tera.add_raw_template(POSIX_TEMPLATE, include_str!("templates/update.sh.tera"))
            .map_err(template_error)?;
        Ok(Self { tera })
    }

    /// Render the procedure for every target in `catalog`
    pub fn render(
        &self,
        catalog: &Catalog,
        flavor: ScriptFlavor,
        task_name: &str,
    ) -> Result<UpdateProcedure> {
        let context = build_context(catalog, flavor, task_name);
        let context = Context::from_serialize(&context).map_err(template_error)?;
        debug!("Rendering template: {}", flavor.template());
        let content = self
            .tera
            .render(flavor.template(), &context)
            .map_err(template_error)?;
        Ok(UpdateProcedure { flavor, content })
    }
}

/// Render the update procedure for `os`
pub fn render_update_procedure(
    catalog: &Catalog,
    os: Platform,
    task_name: &str,
) -> Result<UpdateProcedure> {
    let flavor = ScriptFlavor::for_platform(os)?;
    ProcedureRenderer::new()?.render(catalog, flavor, task_name)
}

fn build_context(catalog: &Catalog, flavor: ScriptFlavor, task_name: &str) -> ProcedureContext {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let mut pip_flags = strings(PIP_QUIET_FLAGS);
    if flavor == ScriptFlavor::Posix {
        pip_flags.push("--break-system-packages".to_string());
    }

    let pythons = match catalog.prerequisite(PrerequisiteKey::Python).map(|p| &p.probe) {
        Some(Probe::VersionedInterpreter { candidates }) => candidates
            .iter()
            .map(|c| ScriptCommand {
                program: flavor.quote(&c.program),
                prefix_args: flavor.quote_flags(&c.prefix_args),
            })
            .collect(),
        _ => Vec::new(),
    };

    ProcedureContext {
        version: env!("CARGO_PKG_VERSION"),
        task_name: task_name.to_string(),
        npm_flags: flavor.quote_flags(&strings(NPM_QUIET_FLAGS)),
        pip_flags: flavor.quote_flags(&pip_flags),
        winget_flags: flavor.quote_flags(&strings(WINGET_FLAGS)),
        pythons,
        targets: catalog
            .targets()
            .iter()
            .map(|t| script_target(t, flavor))
            .collect(),
    }
}

fn script_target(target: &TargetSpec, flavor: ScriptFlavor) -> ScriptTarget {
    let (kind, url) = match &target.backend {
        Backend::PackageManagerCandidates {
            manager: PackageManagerKind::Npm,
        } => ("npm", String::new()),
        Backend::PackageManagerCandidates {
            manager: PackageManagerKind::Winget,
        } => ("winget", String::new()),
        Backend::LanguageToolchain { .. } => ("toolchain", String::new()),
        Backend::VendorScript { url } => ("vendor-script", flavor.quote(url)),
    };
    ScriptTarget {
        key: target.key.clone(),
        label: flavor.quote(&target.label),
        kind,
        candidates: flavor.quote_list(&target.candidates),
        commands: flavor.quote_list(&target.commands),
        url,
    }
}

fn template_error(e: tera::Error) -> Error {
    Error::Template(e.to_string())
}
