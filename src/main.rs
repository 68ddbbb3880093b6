//! Command-line host for the folio catalog.
//!
//! Browses the catalog the way a launcher would: expand a node, print its
//! children, and (with `watch`) re-list whenever a tracked node goes stale.

use clap::{Parser, Subcommand, ValueEnum};
use folio_catalog::{Catalog, CatalogNode, ContentProvider, Expandable, LaunchBridge, TrackedNode};
use folio_config::Settings;
use folio_store::Library;
use futures::StreamExt;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Browse Calibre libraries, Unison profiles and StarDict dictionaries")]
#[command(version)]
struct Args {
    /// Settings file. Defaults to `folio.toml` in the platform config
    /// directory.
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List discovered libraries, most used first.
    Libraries,
    /// Print part of the catalog tree.
    Tree {
        #[arg(long, value_enum, default_value_t = Root::Calibre)]
        root: Root,
        /// How many levels below the root to expand.
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
    },
    /// List books with their default file.
    Books {
        /// Only this library. Defaults to every discovered library.
        #[arg(short, long)]
        library: Option<PathBuf>,
    },
    /// Keep a node's listing up to date until interrupted.
    Watch {
        #[arg(long, value_enum, default_value_t = Root::Calibre)]
        root: Root,
        /// How often to check whether the listing went stale.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Open a library in Calibre.
    Open { library: PathBuf },
    /// Add an e-book file to a library through Calibre.
    Add { library: PathBuf, file: PathBuf },
    /// Run Unison with a profile.
    Sync { profile: String },
    /// Look a word up in the installed dictionaries.
    Lookup {
        word: String,
        /// Only the dictionary with this name.
        #[arg(short, long)]
        dictionary: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Root {
    Calibre,
    Libraries,
    Profiles,
    Dictionaries,
}
impl Root {
    fn node(self) -> CatalogNode {
        match self {
            Self::Calibre => CatalogNode::Root,
            Self::Libraries => CatalogNode::LibraryList,
            Self::Profiles => CatalogNode::Profiles,
            Self::Dictionaries => CatalogNode::Dictionaries,
        }
    }
}

/// Any error worth reporting before exiting.
struct Report(String);
impl<E> From<exn::Exn<E>> for Report
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: exn::Exn<E>) -> Self {
        Self(format!("{err:?}"))
    }
}
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("folio: {report}");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<(), Report> {
    let settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    debug!(?settings, "settings loaded");
    let catalog = Catalog::from_settings(&settings)?;
    let launcher = LaunchBridge::from_settings(&settings);

    match args.command {
        Command::Libraries => {
            for library in catalog.libraries() {
                println!("{}\t{}", library.name(), library.path().display());
            }
        },
        Command::Tree { root, depth } => print_tree(&catalog, root.node(), depth).await,
        Command::Books { library } => {
            let node = match library {
                Some(path) => CatalogNode::Library(library_at(path)?),
                None => CatalogNode::AllBooks,
            };
            let mut children = node.expand(&catalog);
            while let Some(child) = children.next().await {
                if let CatalogNode::Book { .. } = child {
                    let file = child.file().map(|file| file.display().to_string()).unwrap_or_default();
                    println!("{}\t{file}", child.name());
                }
            }
        },
        Command::Watch { root, interval_ms } => watch(&catalog, root.node(), Duration::from_millis(interval_ms)).await,
        Command::Open { library } => {
            launcher.open_library(&library_at(library)?).spawn()?;
        },
        Command::Add { library, file } => {
            let file = std::path::absolute(&file).map_err(|err| Report(format!("{}: {err}", file.display())))?;
            launcher.add_to_library(&library_at(library)?, &file)?.spawn()?;
        },
        Command::Sync { profile } => {
            let Some(profile) = catalog.profiles().list().into_iter().find(|p| p.name == profile) else {
                return Err(Report(format!("no Unison profile named {profile:?}")));
            };
            launcher.open_profile(&profile).spawn()?;
        },
        Command::Lookup { word, dictionary } => {
            let dictionaries = catalog.dictionaries();
            let selected: Vec<_> =
                dictionaries.iter().filter(|d| dictionary.as_ref().is_none_or(|name| &d.name == name)).collect();
            if selected.is_empty() {
                return Err(Report(match dictionary {
                    Some(name) => format!("no dictionary named {name:?}"),
                    None => "no dictionaries installed".to_string(),
                }));
            }
            for dictionary in selected {
                let lookup = CatalogNode::Lookup { dictionary: dictionary.clone(), word: word.clone() };
                let translations: Vec<CatalogNode> = lookup.expand(&catalog).collect().await;
                if translations.is_empty() {
                    continue;
                }
                print_node(&lookup, 0);
                for translation in &translations {
                    print_node(translation, 1);
                }
            }
        },
    }
    Ok(())
}

fn library_at(path: PathBuf) -> Result<Library, Report> {
    let path = std::path::absolute(&path).map_err(|err| Report(format!("{}: {err}", path.display())))?;
    Ok(Library::new(path)?)
}

/// Depth-first listing, children in the order the node yields them.
async fn print_tree(catalog: &Catalog, root: CatalogNode, depth: usize) {
    let mut pending = vec![(root, 0)];
    while let Some((node, level)) = pending.pop() {
        print_node(&node, level);
        if level >= depth || !node.has_children() {
            continue;
        }
        let children: Vec<CatalogNode> = node.expand(catalog).collect().await;
        pending.extend(children.into_iter().rev().map(|child| (child, level + 1)));
    }
}

fn print_node(node: &CatalogNode, level: usize) {
    let indent = "  ".repeat(level);
    match node.description() {
        Some(description) => println!("{indent}{}  ({description})", node.name()),
        None => println!("{indent}{}", node.name()),
    }
}

/// Expand afresh and print the children, sorted by name when the node asks
/// for it.
async fn relist(tracked: &TrackedNode) {
    let mut children: Vec<CatalogNode> = tracked.expand().collect().await;
    if tracked.node().should_sort_lexically() {
        children.sort_by_key(|child| child.name().to_lowercase());
    }
    print_node(tracked.node(), 0);
    for child in &children {
        print_node(child, 1);
    }
}

async fn watch(catalog: &Catalog, node: CatalogNode, interval: Duration) {
    let mut tracked = catalog.track(node);
    relist(&tracked).await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if tracked.refresh() {
                    info!(node = %tracked.node().name(), "listing out of date; refreshing");
                    relist(&tracked).await;
                }
            },
        }
    }
}
