//! List command

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::output;

#[derive(Tabled)]
struct TargetRow {
    key: String,
    name: String,
    backend: String,
    candidates: String,
    prerequisites: String,
    optional: String,
}

/// Print the catalog in install order
pub fn run(ctx: &Context) -> Result<()> {
    if ctx.json() {
        return output::json(&ctx.catalog.targets());
    }

    let rows: Vec<TargetRow> = ctx
        .catalog
        .targets()
        .iter()
        .map(|t| TargetRow {
            key: t.key.clone(),
            name: t.label.clone(),
            backend: t.backend.to_string(),
            candidates: t.candidates.join(", "),
            prerequisites: if t.prerequisite_keys.is_empty() {
                "-".to_string()
            } else {
                t.prerequisite_keys
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
            optional: if t.optional { "yes" } else { "" }.to_string(),
        })
        .collect();

    output::header(&format!("Targets ({})", ctx.platform.os));
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    Ok(())
}
