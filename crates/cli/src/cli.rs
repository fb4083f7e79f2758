use std::path::PathBuf;

use clap::Parser;

/// Import data from journal XML files into the journal database.
///
/// Copy some journal files from the instrument's data directory next to this
/// binary (or point `--dir` at them), then run e.g.
/// `add-journal-entries --instrument ENGINX --hostname NDXENGINX`.
#[derive(Parser, Debug)]
#[command(name = "add-journal-entries", version, about)]
pub struct CliArgs {
    /// Instrument to run on, e.g. ENGINX
    #[arg(short, long, env = "JOURNAL_INSTRUMENT")]
    pub instrument: Option<String>,

    /// Instrument host name, e.g. NDXENGINX
    #[arg(short = 'H', long, visible_alias = "host", env = "JOURNAL_HOSTNAME")]
    pub hostname: Option<String>,

    /// Explicit list of journal files to add (default: scan the directory)
    #[arg(short, long, num_args = 1..)]
    pub files: Option<Vec<String>>,

    /// Directory to ingest (default: the directory holding this binary)
    #[arg(short, long, env = "JOURNAL_DATA_DIR")]
    pub dir: Option<PathBuf>,

    /// Path to the JournalParser executable
    #[arg(long, env = "JOURNALPARSER_EXE")]
    pub parser: Option<PathBuf>,

    /// Call the parser once per run instead of once per cycle file
    #[arg(long)]
    pub per_run: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    pub strict: bool,

    /// Let the parser's standard output through
    #[arg(long)]
    pub show_parser_output: bool,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}
