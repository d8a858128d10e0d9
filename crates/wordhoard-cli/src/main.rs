//! `wordhoard`: manage a vocabulary collection from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::{FieldArgs, Session};

#[derive(Parser)]
#[command(name = "wordhoard", version, about = "Vocabulary manager with spaced repetition")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Collection file (overrides the config)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter wordhoard.toml in the current directory
    Init,

    /// Add a word
    Add {
        /// The word to add
        headword: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Show everything known about a word
    Show {
        /// Headword, id, or id prefix
        word: String,
    },

    /// Change fields of a word
    Update {
        /// Headword, id, or id prefix
        word: String,

        /// Rename the word
        #[arg(long)]
        headword: Option<String>,

        /// Replace all tags (repeatable)
        #[arg(long = "set-tag")]
        set_tags: Vec<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Attach a note to a word
    Note {
        /// Headword, id, or id prefix
        word: String,

        /// Note text
        content: String,

        /// Note tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Where the word was met; prefixes the note
        #[arg(long, conflicts_with = "review")]
        context: Option<String>,

        /// Mark the note as taken during review
        #[arg(long)]
        review: bool,
    },

    /// List words, one page at a time
    List {
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        /// Words per page
        #[arg(long, default_value = "20")]
        page_size: usize,

        /// Sort key: headword, added, reviewed, completeness, status, review_count
        #[arg(long, default_value = "headword")]
        sort: String,

        /// Reverse the sort order
        #[arg(long)]
        reverse: bool,

        /// Only words with this status
        #[arg(long, conflicts_with = "tag")]
        status: Option<String>,

        /// Only words with this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Search headwords, definitions, tags and notes
    Search {
        query: String,

        /// Maximum number of results (default from config)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List words due for review
    Due,

    /// Record how a review went
    Review {
        /// Headword, id, or id prefix
        word: String,

        /// excellent, good, fair or poor (or e/g/f/p)
        performance: String,
    },

    /// Delete words
    Delete {
        /// Headwords, ids, or id prefixes
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Collection statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every tag in use
    Tags,

    /// Snapshot the collection file
    Backup,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wordhoard=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = Session {
        config_path: cli.config,
        data_file: cli.data_file,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Add { headword, fields } => commands::add::execute(&session, headword, fields).await,
        Commands::Show { word } => commands::show::execute(&session, word).await,
        Commands::Update {
            word,
            headword,
            set_tags,
            fields,
        } => commands::update::execute(&session, word, headword, set_tags, fields).await,
        Commands::Note {
            word,
            content,
            tags,
            context,
            review,
        } => commands::note::execute(&session, word, content, tags, context, review).await,
        Commands::List {
            page,
            page_size,
            sort,
            reverse,
            status,
            tag,
        } => commands::list::execute(&session, page, page_size, sort, reverse, status, tag).await,
        Commands::Search { query, limit } => commands::search::execute(&session, query, limit).await,
        Commands::Due => commands::review::due(&session).await,
        Commands::Review { word, performance } => {
            commands::review::execute(&session, word, performance).await
        }
        Commands::Delete { words } => commands::delete::execute(&session, words).await,
        Commands::Stats { json } => commands::stats::execute(&session, json).await,
        Commands::Tags => commands::stats::tags(&session).await,
        Commands::Backup => commands::backup::execute(&session).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
