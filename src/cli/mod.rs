use clap::{Parser, Subcommand, ValueEnum};

pub mod batch;
pub mod output;

#[derive(Parser)]
#[command(
    name = "symex",
    version,
    about = "Declaration-level symbol extraction for Java and C# sources"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to config file (default: .symex/config.toml or symex.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Include only files matching this glob
    #[arg(long, global = true)]
    pub include: Vec<String>,

    /// Exclude files matching this glob
    #[arg(long, global = true)]
    pub exclude: Vec<String>,

    /// Language variant: java or csharp
    #[arg(long, global = true)]
    pub lang: Option<String>,

    /// Report every relationship that could not be resolved in its file
    #[arg(long, global = true)]
    pub report_unresolved: bool,

    /// Exit with status 1 when any file has error diagnostics
    #[arg(long, global = true)]
    pub strict: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract symbols from the given source files
    Extract {
        /// Source files to extract
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Extract every Java and C# file under a directory
    Scan {
        /// Project path (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Print only the summary line
        #[arg(long)]
        summary: bool,
    },
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Compact,
}
