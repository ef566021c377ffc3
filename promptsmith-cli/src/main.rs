//! Promptsmith CLI - convert, check and manage prompt themes

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use promptsmith_config::Format;
use promptsmith_studio::{ConflictStrategy, StudioSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "promptsmith")]
#[command(about = "Convert, check and manage prompt themes")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the data directory from settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a theme between JSON, YAML and TOML
    Convert {
        /// Theme file, or "-" for stdin
        input: String,

        /// Target format (default from settings)
        #[arg(long, value_parser = parse_format)]
        to: Option<Format>,

        /// Source format or filename hint (default: the input name)
        #[arg(long)]
        from: Option<String>,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report alias problems, empty tooltips and unresolved palette colors
    Check {
        input: String,

        #[arg(long)]
        from: Option<String>,

        /// Resolve colors against this palette variant
        #[arg(long)]
        palette: Option<String>,
    },

    /// Escape non-ASCII characters as \uXXXX
    Escape { text: String },

    /// Decode \uXXXX escapes
    Unescape { text: String },

    /// Manage saved configs
    #[command(subcommand)]
    Saved(SavedCommands),
}

#[derive(Subcommand)]
enum SavedCommands {
    /// List saved configs
    List,

    /// Save a theme file as a named config
    Save {
        input: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Tag (repeatable, at most 5)
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        from: Option<String>,
    },

    /// Delete a saved config by id
    Delete { id: String },

    /// Write a saved config's theme out
    Export {
        id: String,

        #[arg(long, value_parser = parse_format)]
        to: Option<Format>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write every saved config to a bundle file
    ExportBundle { output: PathBuf },

    /// Merge a bundle file into the saved configs
    ImportBundle {
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OnConflict::Skip)]
        on_conflict: OnConflict,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OnConflict {
    Skip,
    Rename,
}

impl From<OnConflict> for ConflictStrategy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Skip => ConflictStrategy::Skip,
            OnConflict::Rename => ConflictStrategy::Rename,
        }
    }
}

fn parse_format(s: &str) -> Result<Format, String> {
    Format::from_str(s).ok_or_else(|| format!("unknown format '{}' (json, yaml, toml)", s))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("promptsmith={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = StudioSettings::load_or_default();
    if let Some(dir) = cli.data_dir {
        settings.data_dir = Some(dir);
    }

    match cli.command {
        Commands::Convert {
            input,
            to,
            from,
            output,
        } => {
            let format = to.unwrap_or(settings.default_export_format);
            commands::convert(&input, from.as_deref(), format, output.as_deref())
        }
        Commands::Check {
            input,
            from,
            palette,
        } => {
            let found = commands::check(&input, from.as_deref(), palette.as_deref())?;
            if found > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Escape { text } => {
            println!("{}", promptsmith_config::codec::escape_non_ascii(&text));
            Ok(())
        }
        Commands::Unescape { text } => {
            println!("{}", promptsmith_config::codec::unescape(&text));
            Ok(())
        }
        Commands::Saved(command) => run_saved(command, &settings).await,
    }
}

async fn run_saved(command: SavedCommands, settings: &StudioSettings) -> Result<()> {
    let mut library = commands::open_library(settings).await?;
    match command {
        SavedCommands::List => commands::list_saved(&library),
        SavedCommands::Save {
            input,
            name,
            description,
            tags,
            from,
        } => {
            commands::save(&mut library, &input, from.as_deref(), &name, description, tags).await
        }
        SavedCommands::Delete { id } => commands::delete(&mut library, &id).await,
        SavedCommands::Export { id, to, output } => {
            let format = to.unwrap_or(settings.default_export_format);
            commands::export_saved(&library, &id, format, output.as_deref())
        }
        SavedCommands::ExportBundle { output } => commands::export_bundle(&library, &output),
        SavedCommands::ImportBundle { input, on_conflict } => {
            commands::import_bundle(&mut library, &input, on_conflict.into()).await
        }
    }
}
