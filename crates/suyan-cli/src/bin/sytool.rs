use std::path::Path;

use clap::{Parser, Subcommand};

use suyan_cli::commands::{config_ops, freq_ops, merge_ops};

#[derive(Parser)]
#[command(name = "sytool", about = "SuYan learned-frequency maintenance tool")]
struct Cli {
    /// Frequency store (default: ~/Library/Rime/user_frequency.syfq)
    #[arg(long, global = true)]
    file: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List learned entries
    List {
        /// Only entries for this context
        #[arg(long)]
        context: Option<String>,
    },
    /// Highest-scored words for a context
    Top {
        context: String,
        #[arg(short, long, default_value = "10")]
        n: usize,
    },
    /// Show one entry
    Get { context: String, word: String },
    /// Overwrite the score of one entry
    Set {
        context: String,
        word: String,
        score: u64,
    },
    /// Remove one entry
    Remove { context: String, word: String },
    /// Export as TSV (word, context, score); "-" for stdout
    Export { output_file: String },
    /// Import a TSV export
    Import {
        input_file: String,
        /// Clear the store first instead of keeping the larger score
        #[arg(long)]
        replace: bool,
    },
    /// Drop low-scored or stale entries
    Prune {
        /// Remove entries scored below this
        #[arg(long)]
        below: Option<u64>,
        /// Remove entries unused for this many days
        #[arg(long)]
        unused_days: Option<u64>,
    },
    /// Remove every entry
    Clear,
    /// Show how candidates would be re-ranked for a context
    Merge {
        context: String,
        candidates: Vec<String>,
        /// Output slots available to the caller
        #[arg(long)]
        capacity: Option<usize>,
        /// Settings TOML to use instead of the embedded defaults
        #[arg(long)]
        settings: Option<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the embedded default settings TOML
    SettingsExport,
    /// Validate a settings TOML file
    SettingsValidate { file: String },
}

fn main() {
    let cli = Cli::parse();
    let path_str = cli.file.unwrap_or_else(freq_ops::default_store_path);
    let path = Path::new(&path_str);

    match cli.command {
        Command::List { context } => freq_ops::list(path, context.as_deref()),
        Command::Top { context, n } => freq_ops::top(path, &context, n),
        Command::Get { context, word } => freq_ops::get(path, &context, &word),
        Command::Set {
            context,
            word,
            score,
        } => freq_ops::set(path, &context, &word, score),
        Command::Remove { context, word } => freq_ops::remove(path, &context, &word),
        Command::Export { output_file } => freq_ops::export(path, &output_file),
        Command::Import {
            input_file,
            replace,
        } => freq_ops::import(path, &input_file, replace),
        Command::Prune { below, unused_days } => freq_ops::prune(path, below, unused_days),
        Command::Clear => freq_ops::clear(path),
        Command::Merge {
            context,
            candidates,
            capacity,
            settings,
            json,
        } => merge_ops::merge(
            path,
            &context,
            &candidates,
            capacity,
            settings.as_deref(),
            json,
        ),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
