use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use sunburst::{ClassFilter, EngineConfig, LevelSearch, SunburstEngine, Table};

/// Sunburst: hierarchical aggregation for customer-feedback charts.
///
/// Turns a flat table of classified verbatims into the labels, parents,
/// values and colors a sunburst chart needs, optionally restricted to one
/// class (an emotion, a topic, a human value).
#[derive(Parser)]
#[command(name = "sunburst", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the chart arrays and write them as JSON
    Build {
        #[command(flatten)]
        tree: TreeArgs,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the tree with colors and percentages
    Show {
        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Report which hierarchy level a label belongs to
    Level {
        /// Input table (JSON array of objects)
        #[arg(long, short)]
        input: PathBuf,

        /// Hierarchy levels, highest first (e.g. Zone,Cluster,Country)
        #[arg(long, value_delimiter = ',')]
        levels: Option<Vec<String>>,

        /// The label to look up
        label: String,

        /// Report the most granular level instead of the highest one
        #[arg(long)]
        lowest: bool,
    },
}

/// Options shared by every command that builds a tree.
#[derive(Args)]
struct TreeArgs {
    /// Input table (JSON array of objects)
    #[arg(long, short)]
    input: PathBuf,

    /// Hierarchy levels, highest first (e.g. Zone,Cluster,Country)
    #[arg(long, value_delimiter = ',')]
    levels: Option<Vec<String>>,

    /// Column to filter on (requires --class-value)
    #[arg(long)]
    class_column: Option<String>,

    /// Value of the class column to keep (requires --class-column)
    #[arg(long)]
    class_value: Option<String>,

    /// Do not wrap the top level under a virtual root
    #[arg(long)]
    no_root: bool,

    /// Name of the virtual root
    #[arg(long)]
    root_name: Option<String>,

    /// Contrast exponent for the top level (1.0 = no contrast change)
    #[arg(long)]
    top_exponent: Option<f64>,

    /// Contrast exponent for every deeper sibling group
    #[arg(long)]
    nested_exponent: Option<f64>,

    /// Keep going when a label appears at several levels (first one wins)
    #[arg(long)]
    allow_collisions: bool,
}

impl TreeArgs {
    /// Apply command-line overrides on top of the environment config.
    fn config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::load()?;
        if let Some(levels) = &self.levels {
            config.levels = levels.clone();
        }
        if let Some(name) = &self.root_name {
            config.root_name = Some(name.clone());
        }
        if self.no_root {
            config.root_name = None;
        }
        if let Some(e) = self.top_exponent {
            config.top_exponent = e;
        }
        if let Some(e) = self.nested_exponent {
            config.nested_exponent = e;
        }
        if self.allow_collisions {
            config.allow_label_collisions = true;
        }
        Ok(config)
    }

    fn filter(&self) -> Result<Option<ClassFilter>> {
        Ok(ClassFilter::from_parts(
            self.class_column.clone(),
            self.class_value.clone(),
        )?)
    }
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sunburst=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { tree, output } => {
            // Both halves of the filter are checked before the table is read
            let filter = tree.filter()?;
            let engine = SunburstEngine::new(tree.config()?)?;
            let table = load_table(&tree.input)?;

            let data = engine.sunburst(&table, filter.as_ref())?;
            let json = serde_json::to_string_pretty(&data)?;

            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), nodes = data.len(), "wrote sunburst data");
                }
                None => println!("{json}"),
            }
        }

        Commands::Show { tree } => {
            let filter = tree.filter()?;
            let engine = SunburstEngine::new(tree.config()?)?;
            let table = load_table(&tree.input)?;

            let built = engine.build(&table, filter.as_ref())?;
            sunburst::output::terminal::display_tree(&built);

            if filter.is_some() && !table.is_empty() && built.top_level().is_empty() {
                println!(
                    "{}",
                    "The class filter matched no rows with complete hierarchy values.".yellow()
                );
            }
        }

        Commands::Level {
            input,
            levels,
            label,
            lowest,
        } => {
            let mut config = EngineConfig::load()?;
            if let Some(levels) = levels {
                config.levels = levels;
            }
            let engine = SunburstEngine::new(config)?;
            let table = load_table(&input)?;

            let search = if lowest {
                LevelSearch::Lowest
            } else {
                LevelSearch::Highest
            };
            println!("{}", engine.level_of(&table, &label, search));
        }
    }

    Ok(())
}

/// Read and parse a JSON table from disk.
fn load_table(path: &Path) -> Result<Table> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read input table {}", path.display()))?;
    let table = Table::from_json(&raw)
        .with_context(|| format!("failed to parse input table {}", path.display()))?;
    info!(
        rows = table.len(),
        columns = table.columns().len(),
        "loaded input table"
    );
    Ok(table)
}
