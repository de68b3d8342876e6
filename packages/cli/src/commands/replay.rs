//! Replay a scripted editing session through the real channel.
//!
//! A script is JSON:
//!
//! ```json
//! {
//!   "layout": { "rects": { "hero_h1_1": { "x": 0, "y": 100, "width": 600, "height": 50 } } },
//!   "actions": [
//!     { "action": "edit-text", "key": "hero_h1_1", "html": "Hello" },
//!     { "action": "wait", "ms": 500 }
//!   ],
//!   "generated": { "hero_p_2": "Fresh copy" }
//! }
//! ```

use super::outline::print_outline;
use super::{open_session, parse_values};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use sitecanvas_editor::{run_session, FixedLayout, RenderSession, UserAction};
use sitecanvas_protocol::pair;
use sitecanvas_workspace::{
    CannedGenerator, ContentState, GenerationService, HostController, MemoryStore, NoopGenerator,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Cannot read script {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid script {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Host task failed: {0}")]
    Host(#[from] tokio::task::JoinError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    pub layout: FixedLayout,
    pub actions: Vec<UserAction>,
    /// Canned generator answers by key; empty means generation is unavailable
    pub generated: HashMap<String, String>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ReplayError::Parse {
            path: display,
            source,
        })
    }
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Template id (file name without .html)
    pub template: String,

    /// Script file
    pub script: PathBuf,

    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    /// Write the final document here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Also print the host's reconciled content state as JSON
    #[arg(long)]
    pub state: bool,
}

pub fn replay(args: ReplayArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let script = Script::load(&args.script)?;
    let values = parse_values(&args.values)?;

    let mut session = open_session(
        &config.templates_dir(cwd),
        &args.template,
        &values,
        config.editor.clone(),
    )?;
    session.set_layout(Box::new(script.layout));
    tracing::info!(template = %args.template, actions = script.actions.len(), "replaying script");

    let generator: Arc<dyn GenerationService> = if script.generated.is_empty() {
        Arc::new(NoopGenerator)
    } else {
        Arc::new(CannedGenerator::new(script.generated))
    };

    let host = HostController::new(&args.template, config.host.clone(), MemoryStore::new())?;
    let runtime = tokio::runtime::Runtime::new()?;
    let (session, state) = runtime.block_on(drive(session, host, generator, script.actions))?;

    let html = state.html.clone().unwrap_or_else(|| session.clean_html());
    match &args.out {
        Some(path) => fs::write(path, &html)?,
        None => println!("{}", html),
    }

    if args.state {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }
    report(&state);
    Ok(())
}

async fn drive(
    session: RenderSession,
    host: HostController<MemoryStore>,
    generator: Arc<dyn GenerationService>,
    actions: Vec<UserAction>,
) -> Result<(RenderSession, ContentState), ReplayError> {
    let (editor_end, host_end) = pair();
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (_input_tx, input_rx) = mpsc::unbounded_channel();

    for action in actions {
        // receiver is alive until run_session returns
        let _ = action_tx.send(action);
    }
    drop(action_tx);

    let host = tokio::spawn(host.run(host_end, generator, input_rx));
    let session = run_session(session, editor_end, action_rx).await;
    let host = host.await?;

    Ok((session, host.state().clone()))
}

fn report(state: &ContentState) {
    println!();
    print_outline(&state.outline);
    println!();
    println!(
        "{} revision {}, {} edited, {} deleted, {} images replaced",
        "Done".green().bold(),
        state.revision,
        state.fields.len(),
        state.deleted.len(),
        state.image_replacements.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_parses() {
        let script: Script = serde_json::from_str(
            r#"{
                "actions": [
                    { "action": "focus", "key": "hero_h1_1" },
                    { "action": "toggle-format", "format": "bold" },
                    { "action": "wait", "ms": 500 }
                ],
                "generated": { "hero_p_2": "Fresh" }
            }"#,
        )
        .unwrap();
        assert_eq!(script.actions.len(), 3);
        assert_eq!(script.layout, FixedLayout::new());
        assert_eq!(script.generated["hero_p_2"], "Fresh");
    }

    #[test]
    fn test_missing_script_names_path() {
        let err = Script::load(Path::new("/nonexistent/script.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/script.json"));
    }
}
