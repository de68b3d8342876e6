use super::{open_session, parse_values};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use sitecanvas_editor::Category;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template id (file name without .html)
    pub template: String,

    /// Fill a `{{key}}` placeholder
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// List editable keys instead of printing the document
    #[arg(long)]
    pub keys: bool,
}

pub fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let values = parse_values(&args.values)?;
    let session = open_session(
        &config.templates_dir(cwd),
        &args.template,
        &values,
        config.editor.clone(),
    )?;

    if args.keys {
        for category in [Category::Text, Category::Image, Category::Link] {
            for key in session.keys_of(category) {
                println!("{:<6} {}", category.as_str().dimmed(), key);
            }
        }
        return Ok(());
    }

    let html = session.clean_html();
    match args.out {
        Some(path) => {
            fs::write(&path, html)?;
            println!("  {} {} → {}", "✓".green(), args.template, path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}
