//! Flowify CLI - turn a font into a flow font
//!
//! Reads a JSON font source, compiles the slug program into it, and writes
//! the result:
//! - every word renders as a slug as long as its letters are wide
//! - long words get rounded caps, short ones can be blanked
//! - the feature code can also be written on its own with `--fea`

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowify_compiler::{FlowConfig, Flowifier, FontSource, SlugHeight, SlugShape};

/// Flowify CLI application
#[derive(Parser, Debug)]
#[command(name = "flowify")]
#[command(about = "Turn a font into a flow font", long_about = None)]
#[command(version)]
struct Cli {
    /// Font source (JSON) to convert
    input: PathBuf,

    /// Filename of the new font source
    output: PathBuf,

    /// Configuration file path (TOML)
    #[arg(short, long, env = "FLOWIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Height of slugs: 'x' (x-height), 'cap' (cap height), or font units
    #[arg(long)]
    slug_height: Option<SlugHeight>,

    /// Use rectangles instead of blanks for runs shorter than a slug
    #[arg(long)]
    no_blank: bool,

    /// Use base 10 and add glyphs for typing widths directly
    #[arg(long)]
    debugging: bool,

    /// Shape of slug (pill, rectangle)
    #[arg(long)]
    shape: Option<SlugShape>,

    /// Sidebearings of the semicircular ends
    #[arg(long)]
    margin: Option<i64>,

    /// OpenType feature to contain the flow lookups
    #[arg(long)]
    feature: Option<String>,

    /// Maximum kerning rules per lookup
    #[arg(long)]
    max_kern_rules: Option<usize>,

    /// Also write the generated feature code to this file
    #[arg(long)]
    fea: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Configuration file values, overridden by any flag given.
    fn flow_config(&self) -> anyhow::Result<FlowConfig> {
        let mut config = match &self.config {
            Some(path) => FlowConfig::load(path)
                .with_context(|| format!("reading configuration {}", path.display()))?,
            None => FlowConfig::default(),
        };
        if let Some(height) = self.slug_height {
            config.slug_height = height;
        }
        if self.no_blank {
            config.blank = false;
        }
        if self.debugging {
            config = config.debugging();
        }
        if let Some(shape) = self.shape {
            config.shape = shape;
        }
        if let Some(margin) = self.margin {
            config.margin = margin;
        }
        if let Some(feature) = &self.feature {
            config.feature = feature.clone();
        }
        if let Some(max) = self.max_kern_rules {
            config.max_kern_rules = max;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = cli.flow_config()?;
    let mut font = FontSource::load(&cli.input)
        .with_context(|| format!("reading font {}", cli.input.display()))?;

    let artifact = Flowifier::with_config(config).compile(&mut font)?;

    font.save(&cli.output)
        .with_context(|| format!("writing font {}", cli.output.display()))?;
    if let Some(path) = &cli.fea {
        std::fs::write(path, &artifact.feature_text)
            .with_context(|| format!("writing feature code {}", path.display()))?;
    }

    if cli.verbose {
        let summary = serde_json::json!({
            "feature": artifact.feature_tag,
            "threshold": artifact.threshold,
            "relevant_glyphs": artifact.relevant_glyphs.len(),
            "added_glyphs": artifact.added_glyphs.len(),
            "routines": artifact.routine_count,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    info!(output = %cli.output.display(), "Wrote flow font");
    Ok(())
}
