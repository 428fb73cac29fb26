//! Mapping/template validation command.

use std::path::PathBuf;

use clap::Args;
use console::style;

use fichex_core::{MappingSet, Scope, TemplateWriter};

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Mapping file (YAML)
    #[arg(short, long, default_value = "mapping.yaml")]
    mapping: PathBuf,

    /// Template workbook (XLSX)
    #[arg(short, long)]
    template: PathBuf,

    /// Target sheet name (default: first sheet of the template)
    #[arg(long)]
    sheet: Option<String>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let mapping = MappingSet::load(&args.mapping)?;

    let mut writer = TemplateWriter::new(&args.template)?;
    if let Some(sheet) = &args.sheet {
        writer = writer.with_sheet(sheet.clone())?;
    }
    let sheet_name = writer.sheet_name()?;

    println!(
        "{} Mapping OK: {} field(s), template sheet '{}'",
        style("✓").green(),
        mapping.len(),
        sheet_name
    );
    println!();
    println!("  {:<28} {:>6}  {}", "field", "cell", "flags");
    for rule in mapping.rules() {
        let mut flags = Vec::new();
        if rule.required {
            flags.push("required");
        }
        if rule.scope == Scope::Page {
            flags.push("per-page");
        }
        if let Some(post) = rule.post {
            flags.push(match post {
                fichex_core::PostProcess::Trim => "trim",
                fichex_core::PostProcess::Digits => "digits",
                fichex_core::PostProcess::Date => "date",
                fichex_core::PostProcess::Number => "number",
            });
        }
        println!(
            "  {:<28} {:>6}  {}",
            rule.field,
            rule.cell.to_string(),
            flags.join(", ")
        );
    }

    Ok(())
}
