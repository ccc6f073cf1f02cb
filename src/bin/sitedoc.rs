//! Command-line front end for the site content document
//!
//! Run with: cargo run --bin sitedoc -- show home.hero

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use sitedoc::assets::{AssetKind, AssetResolver, DataUrlEncoder, UploadTarget};
use sitedoc::session::{CommitOutcome, EditSession};
use sitedoc::storage::{loader, LocalStore, Store};
use sitedoc::{schema, Mutation, Node, Path, SiteConfig};

#[derive(Parser)]
#[command(name = "sitedoc", version, about = "Inspect and edit the institute site content")]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overriding the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the document, or the value at a path
    Show { path: Option<String> },

    /// Replace the value at a path. Input that is not JSON is stored as text.
    Set { path: String, value: String },

    /// Prepend a JSON record to a collection
    Insert { collection: String, entry: String },

    /// Remove an entry from a collection by id
    Remove { collection: String, id: String },

    /// Move the entry at one position to another
    Move {
        collection: String,
        from: usize,
        to: usize,
    },

    /// Overwrite the stored content with the defaults
    Reset,

    /// Report whether the stored content needs repair on load
    Check {
        /// Write the repaired document back
        #[arg(long)]
        repair: bool,
    },

    /// Encode an image and store it at a path
    Upload {
        path: String,
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Kind::Default)]
        kind: Kind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Logo,
    Banner,
    Gallery,
    Default,
}

impl From<Kind> for AssetKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Logo => AssetKind::Logo,
            Kind::Banner => AssetKind::Banner,
            Kind::Gallery => AssetKind::Gallery,
            Kind::Default => AssetKind::Default,
        }
    }
}

fn parse_path(text: &str) -> Result<Path> {
    text.parse()
        .with_context(|| format!("invalid path '{}'", text))
}

fn parse_value(text: &str) -> Node {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Node::from)
        .unwrap_or_else(|_| Node::text(text))
}

fn commit(session: &mut EditSession<LocalStore>) -> Result<()> {
    match session.commit().context("failed to save content")? {
        CommitOutcome::Saved(receipt) => {
            println!("saved {} bytes, sha256 {}", receipt.bytes, receipt.digest)
        }
        CommitOutcome::Unchanged => println!("no changes"),
    }
    Ok(())
}

fn edit(session: &mut EditSession<LocalStore>, mutation: Mutation) -> Result<()> {
    let applied = session
        .try_apply(&mutation)
        .with_context(|| format!("cannot edit '{}'", mutation.target()))?;
    if let Some(id) = applied.inserted {
        println!("inserted {}", id);
    }
    commit(session)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SiteConfig::from_file(path)?,
        None => SiteConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    info!("Using data directory {}", config.data_dir.display());

    let store = LocalStore::new(&config.data_dir)
        .with_context(|| format!("cannot open {}", config.data_dir.display()))?;
    let key = config.storage_key.clone();

    match cli.command {
        Command::Show { path } => {
            let session = EditSession::open_with_key(store, key);
            let doc = session.document();
            let node = match path {
                Some(path) => doc.get(&parse_path(&path)?)?,
                None => doc.root(),
            };
            println!("{}", serde_json::to_string_pretty(node)?);
        }
        Command::Set { path, value } => {
            let mut session = EditSession::open_with_key(store, key);
            let mutation = Mutation::Set {
                path: parse_path(&path)?,
                value: parse_value(&value),
            };
            edit(&mut session, mutation)?;
        }
        Command::Insert { collection, entry } => {
            let mut session = EditSession::open_with_key(store, key);
            let entry = serde_json::from_str::<serde_json::Value>(&entry)
                .context("entry must be a JSON object")?;
            let mutation = Mutation::Insert {
                collection: parse_path(&collection)?,
                entry: Node::from(entry),
            };
            edit(&mut session, mutation)?;
        }
        Command::Remove { collection, id } => {
            let mut session = EditSession::open_with_key(store, key);
            let mutation = Mutation::Remove {
                collection: parse_path(&collection)?,
                id: id.into(),
            };
            edit(&mut session, mutation)?;
        }
        Command::Move {
            collection,
            from,
            to,
        } => {
            let mut session = EditSession::open_with_key(store, key);
            let mutation = Mutation::Reorder {
                collection: parse_path(&collection)?,
                from,
                to,
            };
            edit(&mut session, mutation)?;
        }
        Command::Reset => {
            store
                .write(&key, &loader::serialize(&schema::defaults())?)
                .context("failed to write defaults")?;
            println!("content reset to defaults");
        }
        Command::Check { repair } => {
            let Some(raw) = store.read(&key)? else {
                println!("no stored content, defaults will be used");
                return Ok(());
            };
            let repaired = loader::reconcile(Some(&raw));
            let stored = serde_json::from_str::<serde_json::Value>(&raw).ok();
            if stored.as_ref() == Some(&repaired.to_json()) {
                println!("stored content is complete");
            } else if repair {
                store
                    .write(&key, &loader::serialize(&repaired)?)
                    .context("failed to write repaired content")?;
                println!("stored content repaired");
            } else {
                bail!("stored content differs from what loads; run with --repair to rewrite it");
            }
        }
        Command::Upload { path, file, kind } => {
            let target = UploadTarget::Field(parse_path(&path)?);
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;

            let resolver = AssetResolver::new(DataUrlEncoder).with_limits(config.assets);
            let resolved = resolver.upload(target, kind.into(), bytes).await?;

            let mut session = EditSession::open_with_key(store, key);
            edit(
                &mut session,
                Mutation::Set {
                    path: resolved.path,
                    value: Node::text(resolved.asset.as_str()),
                },
            )?;
        }
    }

    Ok(())
}
