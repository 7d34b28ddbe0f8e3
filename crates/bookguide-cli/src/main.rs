//! bookguide CLI
//!
//! Command-line interface for bookguide - reading list, reviews, catalog
//! search and nearby libraries.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bookguide_core::{
    open_backend, Bookshelf, Config, ReviewStore, RoutePlatform, SessionStore, SharedBookshelf,
    ShelfCategory,
};

mod commands;
mod editor;
mod output;

use commands::session::SignIn;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "bookguide")]
#[command(about = "bookguide - Reading list, reviews and nearby libraries")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage your reading list
    Shelf {
        #[command(subcommand)]
        command: ShelfCommands,
    },
    /// Search the book catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Read and write reviews
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Sign in
    Login(SignInArgs),
    /// Create an account and sign in
    Register(SignInArgs),
    /// Sign out
    Logout,
    /// Show who is signed in
    Whoami,
    /// Find libraries near you
    Library {
        #[command(subcommand)]
        command: LibraryCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (account, storage, shelf counts)
    Status,
}

#[derive(Subcommand)]
enum ShelfCommands {
    /// List shelved books
    #[command(alias = "ls")]
    List {
        /// Only this category (want-to-read, read)
        category: Option<ShelfCategory>,
    },
    /// Add a book to a category
    Add {
        /// Book ID
        id: String,
        /// Category to add to
        #[arg(short, long, default_value = "want-to-read")]
        category: ShelfCategory,
        /// Title, for books not in the catalog
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Author, for books not in the catalog (repeatable)
        #[arg(short, long)]
        author: Vec<String>,
    },
    /// Remove a book from the shelf
    #[command(alias = "rm")]
    Remove {
        /// Book ID
        id: String,
        /// Category to remove from (default: every category holding it)
        #[arg(short, long)]
        category: Option<ShelfCategory>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Move a book to another category
    #[command(alias = "mv")]
    Move {
        /// Book ID
        id: String,
        /// Destination category
        to: ShelfCategory,
        /// Source category (default: the other one)
        #[arg(long)]
        from: Option<ShelfCategory>,
    },
    /// Check whether a book is shelved
    Check {
        /// Book ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Search by title or author
    Search {
        /// Search query (empty lists everything)
        #[arg(default_value = "")]
        query: String,
        /// Result page, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Show book details
    Show {
        /// Book ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// List reviews of a book
    #[command(alias = "ls")]
    List {
        /// Book ID
        book_id: String,
    },
    /// Review a book
    Add {
        /// Book ID
        book_id: String,
        /// Review title
        #[arg(short = 'T', long)]
        title: String,
        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,
        /// Review text (opens editor if not provided)
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Edit one of your reviews
    Edit {
        /// Review ID
        id: String,
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[arg(short, long)]
        rating: Option<u8>,
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Delete one of your reviews
    #[command(alias = "rm")]
    Delete {
        /// Review ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct SignInArgs {
    /// Email address
    email: String,
    /// Password (read from stdin if not provided)
    #[arg(short, long)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum LibraryCommands {
    /// List libraries around a location, closest first
    Nearby {
        /// Latitude (default: home_latitude)
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude (default: home_longitude)
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Search radius in km (default: search_radius_km)
        #[arg(short, long)]
        radius: Option<f64>,
    },
    /// Directions link to a library
    Route {
        /// Library ID
        id: String,
        /// Map link flavour (android, apple)
        #[arg(long, default_value = "android")]
        platform: RoutePlatform,
        /// Open the link with the system handler
        #[arg(long)]
        open: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (see `config show`)
        key: String,
        /// Configuration value ("none" clears optional keys)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands must work even when the stored configuration points at
    // unusable storage
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key.clone(), value.clone(), config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);
    debug!(storage = %config.storage, data_dir = ?config.data_dir, "configuration loaded");

    let storage = match open_backend(&config) {
        Ok(storage) => storage,
        Err(e) => {
            if let Some(hint) = e.recovery_suggestion() {
                eprintln!("Hint: {}", hint);
            }
            return Err(e).context("Failed to open storage");
        }
    };

    let shelf = SharedBookshelf::new(Bookshelf::new(storage.clone()));
    let reviews = ReviewStore::new(storage.clone());
    let session = SessionStore::new(storage);

    match cli.command {
        Commands::Shelf { command } => handle_shelf_command(command, &shelf, &config, &output).await,
        Commands::Catalog { command } => match command {
            CatalogCommands::Search { query, page } => {
                let catalog = commands::catalog::open(&config)?;
                commands::catalog::search(&catalog, query, page, &output)
            }
            CatalogCommands::Show { id } => {
                commands::catalog::show(&config, &shelf, &reviews, id, &output).await
            }
        },
        Commands::Review { command } => handle_review_command(command, &reviews, &session, &output),
        Commands::Login(args) => {
            commands::session::sign_in(&session, args.email, args.password, SignIn::Login, &output)
        }
        Commands::Register(args) => commands::session::sign_in(
            &session,
            args.email,
            args.password,
            SignIn::Register,
            &output,
        ),
        Commands::Logout => commands::session::logout(&session, &output),
        Commands::Whoami => commands::session::whoami(&session, &output),
        Commands::Library { command } => match command {
            LibraryCommands::Nearby { lat, lon, radius } => {
                commands::library::nearby(&config, lat, lon, radius, &output)
            }
            LibraryCommands::Route { id, platform, open } => {
                commands::library::route(&config, id, platform, open, &output)
            }
        },
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => {
            commands::status::show(&config, &shelf, &reviews, &session, &output).await
        }
    }
}

async fn handle_shelf_command(
    command: ShelfCommands,
    shelf: &SharedBookshelf<commands::Backend>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        ShelfCommands::List { category } => commands::shelf::list(shelf, category, output).await,
        ShelfCommands::Add {
            id,
            category,
            title,
            author,
        } => commands::shelf::add(shelf, config, id, category, title, author, output).await,
        ShelfCommands::Remove { id, category, yes } => {
            commands::shelf::remove(shelf, id, category, yes, output).await
        }
        ShelfCommands::Move { id, to, from } => {
            commands::shelf::move_book(shelf, id, to, from, output).await
        }
        ShelfCommands::Check { id } => commands::shelf::check(shelf, id, output).await,
    }
}

fn handle_review_command(
    command: ReviewCommands,
    reviews: &ReviewStore<commands::Backend>,
    session: &SessionStore<commands::Backend>,
    output: &Output,
) -> Result<()> {
    match command {
        ReviewCommands::List { book_id } => commands::review::list(reviews, book_id, output),
        ReviewCommands::Add {
            book_id,
            title,
            rating,
            text,
        } => commands::review::add(reviews, session, book_id, title, rating, text, output),
        ReviewCommands::Edit {
            id,
            title,
            rating,
            text,
        } => commands::review::edit(reviews, session, id, title, rating, text, output),
        ReviewCommands::Delete { id, yes } => {
            commands::review::delete(reviews, session, id, yes, output)
        }
    }
}

/// Install a tracing subscriber when BOOKGUIDE_LOG is set
///
/// Logs go to `log_file` when configured, stderr otherwise.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("BOOKGUIDE_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "bookguide_core={},bookguide_cli={}",
        log_level, log_level
    ));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    // Ignore the error if a subscriber is already installed
    let _ = match &config.log_file {
        Some(path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", path, e);
                    return;
                }
            };
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    debug!("logging initialized");
}
