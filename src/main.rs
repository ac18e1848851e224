mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flowmark_engine::{
  ChannelNotifier, Document, EditEvent, EditOrigin, TransitionEngine, inspect_document,
};
use flowmark_workflow::WorkflowRegistry;

use crate::settings::load_settings;

/// Flowmark - workflow stage transitions for plain-text task outlines
#[derive(Parser)]
#[command(name = "flowmark")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the settings file (default: <config dir>/flowmark/settings.json)
  #[arg(long, global = true)]
  settings: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run one engine pass over an edit between two snapshots
  Apply {
    /// Document before the edit
    #[arg(long)]
    old: PathBuf,

    /// Document after the edit
    #[arg(long)]
    new: PathBuf,

    /// How the edit was made
    #[arg(long, value_enum, default_value_t = Origin::Input)]
    origin: Origin,

    /// Write the result back to the `--new` file instead of printing it
    #[arg(long)]
    write: bool,
  },

  /// Print every workflow line of a document as JSON
  Inspect {
    /// Path to the document
    file: PathBuf,
  },

  /// Validate the workflow definitions in the settings
  Check,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Origin {
  Input,
  Paste,
  Programmatic,
}

impl From<Origin> for EditOrigin {
  fn from(origin: Origin) -> Self {
    match origin {
      Origin::Input => EditOrigin::Input,
      Origin::Paste => EditOrigin::Paste,
      Origin::Programmatic => EditOrigin::Programmatic,
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
    .with(
      tracing_subscriber::fmt::layer()
        .without_time()
        .with_writer(std::io::stderr),
    )
    .init();

  let Some(command) = cli.command else {
    println!("flowmark - use --help to see available commands");
    return Ok(());
  };

  let settings = cli.settings;
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async move {
    match command {
      Commands::Apply {
        old,
        new,
        origin,
        write,
      } => apply(settings, old, new, origin.into(), write).await,
      Commands::Inspect { file } => inspect(file).await,
      Commands::Check => check(settings).await,
    }
  })
}

async fn apply(
  settings: Option<PathBuf>,
  old: PathBuf,
  new: PathBuf,
  origin: EditOrigin,
  write: bool,
) -> Result<()> {
  let settings = load_settings(settings.as_deref()).await?;

  let before = tokio::fs::read_to_string(&old)
    .await
    .with_context(|| format!("failed to read document: {}", old.display()))?;
  let after = tokio::fs::read_to_string(&new)
    .await
    .with_context(|| format!("failed to read document: {}", new.display()))?;

  let (tx, mut rx) = mpsc::unbounded_channel();
  let engine = TransitionEngine::with_notifier(settings, ChannelNotifier::new(tx))
    .context("failed to load workflow definitions")?;

  let event = EditEvent::from_snapshots(&before, &after).with_origin(origin);
  let edit = engine.handle_now(&event);

  while let Ok(notice) = rx.try_recv() {
    eprintln!("{}", serde_json::to_string(&notice)?);
  }

  let output = match &edit {
    Some(edit) => edit.apply(&event.new),
    None => after,
  };

  if write {
    if edit.is_some() {
      tokio::fs::write(&new, &output)
        .await
        .with_context(|| format!("failed to write document: {}", new.display()))?;
    }
  } else {
    print!("{}", output);
  }

  Ok(())
}

async fn inspect(file: PathBuf) -> Result<()> {
  let content = tokio::fs::read_to_string(&file)
    .await
    .with_context(|| format!("failed to read document: {}", file.display()))?;

  let lines = inspect_document(&Document::new(content));
  println!("{}", serde_json::to_string_pretty(&lines)?);

  Ok(())
}

async fn check(settings: Option<PathBuf>) -> Result<()> {
  let settings = load_settings(settings.as_deref()).await?;
  let registry =
    WorkflowRegistry::from_settings(&settings).context("invalid workflow definitions")?;

  if registry.is_empty() {
    println!("no workflows defined");
    return Ok(());
  }

  let mut warnings = 0;
  for workflow in registry.iter() {
    let graph = workflow.graph();
    println!(
      "{} ({}): {} stages, root '{}'",
      workflow.id,
      workflow.name,
      workflow.stages().len(),
      graph.root()
    );

    for (from, to) in graph.dangling() {
      println!("  warning: stage '{}' proceeds to unknown stage '{}'", from, to);
      warnings += 1;
    }
    for stage in graph.unreachable() {
      println!("  warning: stage '{}' is unreachable from '{}'", stage, graph.root());
      warnings += 1;
    }
  }

  println!("{} workflows, {} warnings", registry.len(), warnings);
  Ok(())
}
