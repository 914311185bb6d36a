//! Maintenance subcommands: timezone conversion, reload and translations

use std::io::{BufRead, Write};
use std::time::Instant;

use kimai_domain::{KimaiError, Result};
use kimai_infra::translations::{DeeplClient, TranslationError};
use tracing::{error, warn};

use super::{ConvertTimezoneArgs, TranslationArgs, SURFACE};
use crate::context::AppContext;
use crate::utils::{execute_logged, log_command_execution};

/// Exit code of a failed translation run
const EXIT_FAILURE: i32 = 1;

pub async fn convert_timezone(
    ctx: &AppContext,
    args: &ConvertTimezoneArgs,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<i32> {
    let converter = ctx.timezone_converter();
    let amount = converter.count(args.first_id, args.last_id).await?;

    if !args.yes {
        write!(out, "This will update {amount} timesheet records, continue (y/n) ? ")?;
        out.flush()?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if answer.trim() != "y" {
            writeln!(out, "Aborting.")?;
            return Ok(0);
        }
    }

    execute_logged("convert_timezone", SURFACE, || async {
        converter.convert(args.first_id, args.last_id, std::io::stdout()).await
    })
    .await?;
    writeln!(out)?;
    Ok(0)
}

pub async fn reload(ctx: &AppContext, out: &mut dyn Write) -> Result<i32> {
    writeln!(out, "Reloading configurations ...")?;
    let reloader = ctx.reloader();

    let result = execute_logged("reload", SURFACE, || async {
        Ok(tokio::task::spawn_blocking(move || reloader.run())
            .await
            .map_err(|err| KimaiError::Internal(err.to_string()))?)
    })
    .await?;

    match result {
        Ok(outcome) => {
            writeln!(out, "{}", outcome.message())?;
            Ok(0)
        }
        Err(err) => {
            error!(error = %err, exit_code = err.exit_code(), "reload failed");
            writeln!(out, "{err}")?;
            Ok(err.exit_code())
        }
    }
}

/// Run every requested translation task in a fixed order; the first failing
/// task ends the run.
pub async fn translations(
    ctx: &AppContext,
    args: &TranslationArgs,
    out: &mut dyn Write,
) -> Result<i32> {
    let tool = ctx.translation_tool();
    let start = Instant::now();

    let outcome: std::result::Result<(), TranslationError> = async {
        if args.resname {
            let files = tool.fix_resnames()?;
            writeln!(out, "Fixed resname in {files} files")?;
        }

        if let Some(key) = &args.delete_resname {
            let files = tool.delete_resname(key)?;
            writeln!(out, "Deleted {key} from {files} files")?;
        }

        if args.fill_empty {
            let filled = tool.fill_empty()?;
            writeln!(out, "Filled {filled} empty translations")?;
        }

        if args.extension {
            for file in tool.wrong_extensions()? {
                writeln!(out, "[WARNING] {}", file.display())?;
            }
        }

        if args.duplicates {
            for (key, domains) in tool.duplicates()? {
                writeln!(out, "{key} => {}", domains.join(", "))?;
            }
        }

        match (&args.translate_locale, &args.translate_deepl) {
            (None, None) => {}
            (Some(_), None) => return Err(TranslationError::MissingAuthKey),
            (None, Some(_)) => return Err(TranslationError::MissingLocale),
            (Some(locale), Some(key)) => {
                let client = DeeplClient::new(ctx.config.deepl.url.clone(), key.clone())?;
                writeln!(out, "Translating into {locale}")?;
                let units = tool.translate(locale, &client).await?;
                writeln!(out, "Translated {units} units")?;
            }
        }

        Ok(())
    }
    .await;
    log_command_execution("translations", SURFACE, start.elapsed(), outcome.is_ok());

    match outcome {
        Ok(()) => Ok(0),
        Err(TranslationError::Io(err)) => Err(KimaiError::from(err)),
        Err(err) => {
            warn!(error = %err, "translation command failed");
            writeln!(out, "[ERROR] {err}")?;
            Ok(EXIT_FAILURE)
        }
    }
}
