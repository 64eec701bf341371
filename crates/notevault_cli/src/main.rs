//! NoteVault command-line entry point.
//!
//! # Responsibility
//! - Expose note lifecycle, version history, tags and snippets over a local
//!   SQLite database.
//! - Print every result as one JSON document on stdout.
//!
//! # Invariants
//! - Every note and snippet command acts on behalf of `--user`.
//! - Failures go to stderr with a non-zero exit code; stdout stays empty.

use clap::{Args, Parser, Subcommand};
use log::info;
use notevault_core::{
    CoreConfig, DeletedFilter, NewNote, NewSnippet, NoteListQuery, NoteService, NoteUpdate,
    SnippetListQuery, SnippetService, SnippetUpdate, SqliteStore,
};
use serde_json::{json, Value};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "notevault")]
#[command(author, version, about = "Versioned notes with trash and snippets")]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite database file (in-memory when omitted)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Acting user id
    #[arg(long, global = true)]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Note lifecycle commands
    #[command(subcommand)]
    Notes(NoteCommand),

    /// Content history of one note
    #[command(subcommand)]
    Versions(VersionCommand),

    /// Tag catalog
    #[command(subcommand)]
    Tags(TagCommand),

    /// Code snippets
    #[command(subcommand)]
    Snippets(SnippetCommand),
}

#[derive(Subcommand)]
enum NoteCommand {
    /// List notes, most recently updated first
    List {
        /// `true` for trash only, `false` for active only; omit for both
        #[arg(long)]
        deleted: Option<String>,

        /// Only notes carrying this tag
        #[arg(long)]
        tag: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Show one note
    Get { id: Uuid },

    /// Create a note
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        favorite: bool,
    },

    /// Apply a partial update
    Update {
        id: Uuid,

        #[command(flatten)]
        fields: NoteFields,
    },

    /// Replace the tag set of a note
    Tag {
        id: Uuid,

        /// Tag to keep (repeatable; none clears all tags)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Move a note to trash, or purge it from trash with `--force`
    Delete {
        id: Uuid,

        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct NoteFields {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    content: Option<String>,

    #[arg(long)]
    favorite: Option<bool>,

    /// `false` takes the note out of trash
    #[arg(long)]
    deleted: Option<bool>,
}

#[derive(Subcommand)]
enum VersionCommand {
    /// List versions of a note, newest first
    List { note: Uuid },

    /// Show one version
    Get {
        note: Uuid,
        #[arg(id = "version_id", value_name = "VERSION")]
        version: Uuid,
    },

    /// Copy a version's content back onto its note
    Restore {
        note: Uuid,
        #[arg(id = "version_id", value_name = "VERSION")]
        version: Uuid,
    },
}

#[derive(Subcommand)]
enum TagCommand {
    /// List every known tag
    List,

    /// Add a tag to the catalog
    Create { name: String },

    /// Rename a tag everywhere it is used
    Rename { id: i64, name: String },

    /// Delete a tag and detach it from notes and snippets
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum SnippetCommand {
    /// List snippets
    List {
        #[arg(long)]
        note: Option<Uuid>,

        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one snippet
    Get { id: Uuid },

    /// Create a snippet
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        code: String,

        #[arg(long, default_value = "")]
        language: String,

        /// Parent note
        #[arg(long)]
        note: Option<Uuid>,

        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Apply a partial update
    Update {
        id: Uuid,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        language: Option<String>,

        /// Attach to this note
        #[arg(long, conflicts_with = "detach")]
        note: Option<Uuid>,

        /// Clear the parent note
        #[arg(long)]
        detach: bool,
    },

    /// Delete a snippet permanently
    Delete { id: Uuid },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<Value> {
    let mut config = CoreConfig {
        db_path: cli.db,
        log_dir: cli.log_dir,
        ..CoreConfig::default()
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.init_logging()?;

    let mut conn = config.open_connection()?;
    info!("event=cli_start module=cli status=ok");

    match cli.command {
        Commands::Notes(command) => {
            let actor = require_user(cli.user)?;
            let mut service = NoteService::new(SqliteStore::new(&mut conn));
            cmd_notes(&mut service, actor, command)
        }
        Commands::Versions(command) => {
            let actor = require_user(cli.user)?;
            let mut service = NoteService::new(SqliteStore::new(&mut conn));
            cmd_versions(&mut service, actor, command)
        }
        Commands::Tags(command) => {
            let mut service = NoteService::new(SqliteStore::new(&mut conn));
            cmd_tags(&mut service, command)
        }
        Commands::Snippets(command) => {
            let actor = require_user(cli.user)?;
            let mut service = SnippetService::new(SqliteStore::new(&mut conn));
            cmd_snippets(&mut service, actor, command)
        }
    }
}

fn require_user(user: Option<Uuid>) -> CliResult<Uuid> {
    user.ok_or_else(|| "--user is required for this command".into())
}

fn cmd_notes(
    service: &mut NoteService<SqliteStore<'_>>,
    actor: Uuid,
    command: NoteCommand,
) -> CliResult<Value> {
    let value = match command {
        NoteCommand::List {
            deleted,
            tag,
            limit,
            offset,
        } => {
            let query = NoteListQuery {
                deleted: DeletedFilter::parse_param(deleted.as_deref()),
                tag,
                limit,
                offset,
            };
            serde_json::to_value(service.list_notes(actor, &query)?)?
        }
        NoteCommand::Get { id } => serde_json::to_value(service.get_note(actor, id)?)?,
        NoteCommand::Create {
            title,
            content,
            tags,
            favorite,
        } => {
            let request = NewNote {
                title,
                content,
                tags,
                favorite,
            };
            serde_json::to_value(service.create_note(actor, request)?)?
        }
        NoteCommand::Update { id, fields } => {
            let update = NoteUpdate {
                title: fields.title,
                content: fields.content,
                tags: None,
                favorite: fields.favorite,
                deleted: fields.deleted,
            };
            serde_json::to_value(service.update_note(actor, id, update)?)?
        }
        NoteCommand::Tag { id, tags } => {
            serde_json::to_value(service.set_note_tags(actor, id, tags)?)?
        }
        NoteCommand::Delete { id, force } => {
            let outcome = service.delete(actor, id, force)?;
            json!({ "id": id, "status": outcome.status() })
        }
    };
    Ok(value)
}

fn cmd_versions(
    service: &mut NoteService<SqliteStore<'_>>,
    actor: Uuid,
    command: VersionCommand,
) -> CliResult<Value> {
    let value = match command {
        VersionCommand::List { note } => serde_json::to_value(service.list_versions(actor, note)?)?,
        VersionCommand::Get { note, version } => {
            serde_json::to_value(service.get_version(actor, note, version)?)?
        }
        VersionCommand::Restore { note, version } => {
            let outcome = service.restore_version(actor, note, version)?;
            json!({
                "status": outcome.status(),
                "note": outcome.note,
                "snapshot": outcome.snapshot,
            })
        }
    };
    Ok(value)
}

fn cmd_tags(service: &mut NoteService<SqliteStore<'_>>, command: TagCommand) -> CliResult<Value> {
    let value = match command {
        TagCommand::List => serde_json::to_value(service.list_tags()?)?,
        TagCommand::Create { name } => serde_json::to_value(service.create_tag(&name)?)?,
        TagCommand::Rename { id, name } => serde_json::to_value(service.rename_tag(id, &name)?)?,
        TagCommand::Delete { id } => {
            service.delete_tag(id)?;
            json!({ "id": id, "status": "deleted" })
        }
    };
    Ok(value)
}

fn cmd_snippets(
    service: &mut SnippetService<SqliteStore<'_>>,
    actor: Uuid,
    command: SnippetCommand,
) -> CliResult<Value> {
    let value = match command {
        SnippetCommand::List { note, tag } => {
            let query = SnippetListQuery { note_id: note, tag };
            serde_json::to_value(service.list_snippets(actor, &query)?)?
        }
        SnippetCommand::Get { id } => serde_json::to_value(service.get_snippet(actor, id)?)?,
        SnippetCommand::Create {
            title,
            code,
            language,
            note,
            tags,
        } => {
            let request = NewSnippet {
                title,
                code,
                language,
                note_id: note,
                tags,
            };
            serde_json::to_value(service.create_snippet(actor, request)?)?
        }
        SnippetCommand::Update {
            id,
            title,
            code,
            language,
            note,
            detach,
        } => {
            let note_id = if detach { Some(None) } else { note.map(Some) };
            let update = SnippetUpdate {
                title,
                code,
                language,
                note_id,
                tags: None,
            };
            serde_json::to_value(service.update_snippet(actor, id, update)?)?
        }
        SnippetCommand::Delete { id } => {
            service.delete_snippet(actor, id)?;
            json!({ "id": id, "status": "deleted" })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{run, Cli};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn note_commands_require_a_user() {
        let cli = Cli::parse_from(["notevault", "notes", "list"]);
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("--user"));
    }

    #[test]
    fn tag_listing_works_on_a_fresh_database() {
        let cli = Cli::parse_from(["notevault", "tags", "list"]);
        let output = run(cli).unwrap();
        assert_eq!(output, serde_json::json!([]));
    }
}
