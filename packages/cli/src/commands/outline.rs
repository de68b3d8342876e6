use super::{open_session, parse_values};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use sitecanvas_editor::build_outline;
use sitecanvas_protocol::{ItemType, SectionOutline};
use std::path::Path;

#[derive(Debug, Args)]
pub struct OutlineArgs {
    /// Template id (file name without .html)
    pub template: String,

    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn outline(args: OutlineArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let values = parse_values(&args.values)?;
    let session = open_session(
        &config.templates_dir(cwd),
        &args.template,
        &values,
        config.editor.clone(),
    )?;

    let sections = build_outline(session.tree());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
    } else {
        print_outline(&sections);
    }
    Ok(())
}

pub fn print_outline(sections: &[SectionOutline]) {
    for section in sections {
        println!(
            "{} {}",
            section.label.bright_white().bold(),
            format!("({})", section.section_id).dimmed()
        );
        for item in &section.items {
            let kind = match item.item_type {
                ItemType::Text => "text".cyan(),
                ItemType::Image => "image".magenta(),
                ItemType::Link => "link".blue(),
            };
            println!("  {:<6} {} {}", kind, item.label, item.key.dimmed());
        }
    }
}
