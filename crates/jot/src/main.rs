//! Jot CLI - tagged notes from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use jot_core::{NoteData, NoteFilter, NotesState, UpdateNote};
use jot_files::FilesStore;
use std::io::{self, Read, Write};
use std::path::PathBuf;

const JOT_DIR: &str = ".jot";
const PREVIEW_LEN: usize = 80;

#[derive(Parser)]
#[command(name = "jot", about = "Tagged notes from the command line", version)]
struct Cli {
    /// Path to the .jot directory (default: search upward from the current directory)
    #[arg(long, global = true, env = "JOT_DIR")]
    dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new jot directory
    Init {
        /// Delete existing notes and tags and reinitialize
        #[arg(long)]
        reinitialize: bool,
    },
    /// Add a new note
    Add {
        /// Note title
        #[arg(long)]
        title: String,
        /// Comma-separated tag labels (unknown labels are created)
        #[arg(long)]
        tags: Option<String>,
        /// Note body in markdown (reads from stdin if not provided)
        #[arg(long)]
        body: Option<String>,
    },
    /// List notes, optionally filtered
    Ls {
        /// Only notes whose title contains this text (case-insensitive)
        #[arg(long)]
        title: Option<String>,
        /// Only notes carrying all of these comma-separated tag labels
        #[arg(long)]
        tags: Option<String>,
        /// Print the matching notes as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Show a note
    Show {
        /// Note ID (or unique prefix)
        id: String,
        /// Print the note as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a note
    Edit {
        /// Note ID (or unique prefix)
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New comma-separated tag labels (unknown labels are created)
        #[arg(long)]
        tags: Option<String>,
        /// New body (reads from stdin if not provided and stdin is not a tty)
        #[arg(long)]
        body: Option<String>,
    },
    /// Delete one or more notes
    Rm {
        /// Comma-separated note IDs (or unique prefixes)
        ids: String,
    },
    /// List all tags
    Tags {
        /// Print the tags and their note counts as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Create a tag
    Add {
        /// Tag label
        label: String,
    },
    /// Change a tag's label
    Rename {
        /// Tag ID (or unique prefix)
        id: String,
        /// New label
        label: String,
    },
    /// Delete a tag (notes keep their reference but no longer show it)
    Rm {
        /// Tag ID (or unique prefix)
        id: String,
    },
}

fn init_logging(verbose: u8) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);

    if verbose > 0 {
        builder.filter_level(match verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Find the .jot directory by searching up from current directory
fn find_jot_dir() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let jot_path = current.join(JOT_DIR);
        if jot_path.is_dir() {
            return Some(jot_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Get the jot directory path, or error if not initialized
fn get_jot_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        if !dir.is_dir() {
            bail!(
                "{} does not exist. Run 'jot init' to initialize it.",
                dir.display()
            );
        }
        return Ok(dir);
    }

    match find_jot_dir() {
        Some(jot_dir) => Ok(jot_dir),
        None => bail!("No .jot directory found. Run 'jot init' to initialize a new one."),
    }
}

fn open_state(jot_dir: &PathBuf) -> Result<NotesState<FilesStore>> {
    log::debug!("Opening {}", jot_dir.display());
    let store = FilesStore::open(jot_dir).context("Failed to open store")?;
    NotesState::open(store).context("Failed to load notes")
}

fn parse_list(items: &str) -> Vec<String> {
    items
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolve a user-supplied id against `ids`: exact match first, then unique prefix.
fn resolve_id<'a>(input: &str, ids: impl Iterator<Item = &'a str> + Clone) -> Result<Option<String>> {
    let input = input.trim();
    if let Some(id) = ids.clone().find(|id| *id == input) {
        return Ok(Some(id.to_string()));
    }
    if input.is_empty() {
        return Ok(None);
    }

    let matches: Vec<&str> = ids.filter(|id| id.starts_with(input)).collect();
    match matches.as_slice() {
        [] => Ok(None),
        [id] => Ok(Some(id.to_string())),
        _ => bail!("Ambiguous ID prefix '{}' ({} matches)", input, matches.len()),
    }
}

fn resolve_note_id(state: &NotesState<FilesStore>, input: &str) -> Result<Option<String>> {
    resolve_id(input, state.notes().iter().map(|n| n.id.as_str()))
}

fn resolve_tag_id(state: &NotesState<FilesStore>, input: &str) -> Result<Option<String>> {
    resolve_id(input, state.tags().iter().map(|t| t.id.as_str()))
}

/// Trim a tag label given on the command line; blank labels are rejected.
fn parse_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        bail!("Tag label cannot be empty");
    }
    Ok(label.to_string())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;
    Ok(buf)
}

fn is_stdin_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Init { reinitialize } = cli.command {
        let jot_dir = cli.dir.unwrap_or_else(|| PathBuf::from(JOT_DIR));

        if jot_dir.exists() {
            if reinitialize {
                std::fs::remove_dir_all(&jot_dir)
                    .context("Failed to remove existing .jot directory")?;
            } else if jot_dir.join("notes.json").exists() || jot_dir.join("tags.json").exists() {
                bail!("Jot is already initialized in this directory. Use --reinitialize to delete and recreate.");
            }
        }

        // Opening writes the empty collections
        open_state(&jot_dir)?;

        if reinitialize {
            println!("Reinitialized jot in {}", jot_dir.display());
        } else {
            println!("Initialized jot in {}", jot_dir.display());
        }
        return Ok(());
    }

    // All other commands need an initialized directory
    let jot_dir = get_jot_dir(cli.dir)?;
    let mut state = open_state(&jot_dir)?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Add { title, tags, body } => {
            let markdown = match body {
                Some(b) => b,
                None => read_stdin()?,
            };
            let labels = tags.map(|t| parse_list(&t)).unwrap_or_default();

            let id = state.create_note_with_labels(
                NoteData {
                    title,
                    markdown,
                    tag_ids: Vec::new(),
                },
                &labels,
            )?;
            println!("Added note {}", id);
        }

        Commands::Ls { title, tags, json } => {
            let labels = tags.map(|t| parse_list(&t)).unwrap_or_default();
            let filter = NoteFilter::new()
                .with_title(title.unwrap_or_default())
                .with_tags(state.find_tags_by_label(&labels)?);

            let summaries: Vec<_> = state
                .filter(&filter)
                .iter()
                .map(|note| note.to_summary(PREVIEW_LEN))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
                return Ok(());
            }

            for summary in summaries {
                let labels: Vec<&str> = summary.tags.iter().map(|t| t.label.as_str()).collect();
                println!(
                    "{}: {} [{}] -- {}",
                    summary.id,
                    summary.title,
                    labels.join(","),
                    summary.body_preview
                );
            }
        }

        Commands::Show { id, json } => {
            let Some(note) = resolve_note_id(&state, &id)?.and_then(|id| state.note(&id)) else {
                eprintln!("Note {} not found", id);
                std::process::exit(1);
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&note)?);
                return Ok(());
            }

            println!("# {}\n", note.title);
            println!("{}", note.markdown);
            println!("\n---\n");
            println!("ID: {}", note.id);
            println!("Tags: {}", note.tag_labels().join(","));
        }

        Commands::Edit {
            id,
            title,
            tags,
            body,
        } => {
            let Some(note_id) = resolve_note_id(&state, &id)? else {
                eprintln!("Note {} not found", id);
                std::process::exit(1);
            };

            let body = if body.is_none() && !is_stdin_tty() {
                Some(read_stdin()?).filter(|b| !b.is_empty())
            } else {
                body
            };

            let labels = tags.map(|t| parse_list(&t));
            let update = UpdateNote {
                title,
                markdown: body,
                tag_ids: None,
            };

            if update.is_empty() && labels.is_none() {
                eprintln!("Nothing to update");
                std::process::exit(1);
            }

            let mut fields = update.fields();
            if labels.is_some() {
                fields.push("tags");
            }
            if state.update_note_with_labels(&note_id, update, labels.as_deref())? {
                println!("Edited note {}: Updated {}", note_id, fields.join(", "));
            } else {
                eprintln!("Note {} not found", id);
                std::process::exit(1);
            }
        }

        Commands::Rm { ids } => {
            let ids = parse_list(&ids);
            if ids.is_empty() {
                eprintln!("No note IDs provided");
                std::process::exit(1);
            }

            let mut deleted = Vec::new();
            let mut not_found = Vec::new();

            for id in &ids {
                let deleted_id = match resolve_note_id(&state, id)? {
                    Some(note_id) => state.delete_note(&note_id)?.then_some(note_id),
                    None => None,
                };
                match deleted_id {
                    Some(note_id) => deleted.push(note_id),
                    None => not_found.push(id),
                }
            }

            for id in &deleted {
                println!("Deleted note {}", id);
            }

            if !not_found.is_empty() {
                for id in &not_found {
                    eprintln!("Note {} not found", id);
                }
                std::process::exit(1);
            }
        }

        Commands::Tags { json } => {
            let counts = state.tag_counts();
            if json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
                return Ok(());
            }

            for tc in counts {
                let noun = if tc.count == 1 { "note" } else { "notes" };
                println!("{}  {} ({} {})", tc.tag.id, tc.tag.label, tc.count, noun);
            }
        }

        Commands::Tag { command } => match command {
            TagCommands::Add { label } => {
                let tag = state.create_tag(&parse_label(&label)?)?;
                println!("Added tag {} ({})", tag.id, tag.label);
            }

            TagCommands::Rename { id, label } => {
                let label = parse_label(&label)?;
                let renamed = match resolve_tag_id(&state, &id)? {
                    Some(tag_id) => state.rename_tag(&tag_id, &label)?.then_some(tag_id),
                    None => None,
                };
                let Some(tag_id) = renamed else {
                    eprintln!("Tag {} not found", id);
                    std::process::exit(1);
                };
                println!("Renamed tag {} to {}", tag_id, label);
            }

            TagCommands::Rm { id } => {
                let removed = match resolve_tag_id(&state, &id)? {
                    Some(tag_id) => state.remove_tag(&tag_id)?.then_some(tag_id),
                    None => None,
                };
                let Some(tag_id) = removed else {
                    eprintln!("Tag {} not found", id);
                    std::process::exit(1);
                };
                println!("Deleted tag {}", tag_id);
            }
        },
    }

    Ok(())
}
