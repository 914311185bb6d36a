//! Command line interface
//!
//! `kimai serve` runs the JSON API, every other subcommand is a one-shot
//! maintenance task that prints to stdout and maps its outcome to the
//! process exit code.

mod maintenance;
mod users;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use kimai_domain::{Config, Result};
use kimai_infra::config;

use crate::context::AppContext;
use crate::http;
use crate::utils::{execute_logged, LogFormat};

pub use maintenance::{convert_timezone, reload, translations};
pub use users::{create_user, promote_user};

const SURFACE: &str = "cli";

#[derive(Debug, Parser)]
#[command(name = "kimai", version, about = "Kimai time tracking server and maintenance tools")]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "KIMAI_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Config file, environment variables and the standard locations otherwise
    #[arg(long, short, global = true, env = "KIMAI_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        /// Listen address, `server.bind` when missing
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create or upgrade the database schema
    Migrate,
    /// Re-interpret stored timestamps as local time of their timezone
    ConvertTimezone(ConvertTimezoneArgs),
    /// Lint config and translations, then rebuild the cache
    Reload,
    /// Translation file maintenance
    Translations(TranslationArgs),
    /// User administration
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Debug, Args)]
pub struct ConvertTimezoneArgs {
    /// The database ID which should be converted first
    #[arg(long = "first-id", short = 'f')]
    pub first_id: Option<i64>,
    /// The database ID which should be converted last
    #[arg(long = "last-id", short = 'l')]
    pub last_id: Option<i64>,
    /// Skip the confirmation
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Default, Args)]
pub struct TranslationArgs {
    /// Fix the resname vs. id attribute
    #[arg(long)]
    pub resname: bool,
    /// Find duplicate translation keys
    #[arg(long)]
    pub duplicates: bool,
    /// Deletes the translation by resname
    #[arg(long = "delete-resname", value_name = "KEY")]
    pub delete_resname: Option<String>,
    /// Find translation files with wrong extensions
    #[arg(long)]
    pub extension: bool,
    /// Pre-fills empty translations with the english version
    #[arg(long = "fill-empty")]
    pub fill_empty: bool,
    /// Translate into the given locale with DeepL
    #[arg(long = "translate-locale", value_name = "LOCALE")]
    pub translate_locale: Option<String>,
    /// Translate using the "DeepL API Free" auth-key
    #[arg(long = "translate-deepl", value_name = "KEY", env = "DEEPL_AUTH_KEY")]
    pub translate_deepl: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Give a user a role, or super admin with `--super`
    Promote {
        username: String,
        role: Option<String>,
        #[arg(long = "super")]
        super_admin: bool,
    },
    /// Create a user, optionally with an API token
    Create {
        username: String,
        email: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
}

/// Resolve the configuration for `--config`.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => config::load_from_file(Some(path)),
        None => config::load(),
    }
}

/// Run `command` and return the process exit code.
pub async fn run(command: Command, config: Config) -> Result<i32> {
    let ctx = Arc::new(AppContext::with_config(config)?);
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    dispatch(command, ctx, &mut input, &mut out).await
}

/// Run `command` against an existing context with explicit I/O.
pub async fn dispatch(
    command: Command,
    ctx: Arc<AppContext>,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<i32> {
    match command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| ctx.config.server.bind.clone());
            http::serve(ctx, &bind).await?;
            Ok(0)
        }
        Command::Migrate => {
            execute_logged("migrate", SURFACE, || async move {
                ctx.db.run_migrations()?;
                let version = ctx.db.schema_version()?;
                writeln!(out, "Database schema is at version {version}")?;
                Ok(0)
            })
            .await
        }
        Command::ConvertTimezone(args) => convert_timezone(&ctx, &args, input, out).await,
        Command::Reload => reload(&ctx, out).await,
        Command::Translations(args) => translations(&ctx, &args, out).await,
        Command::User(UserCommand::Promote { username, role, super_admin }) => {
            promote_user(&ctx, &username, role.as_deref(), super_admin, out).await
        }
        Command::User(UserCommand::Create { username, email, role, token }) => {
            create_user(&ctx, &username, &email, role.as_deref(), token.as_deref(), out).await
        }
    }
}
