//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{EditCommand, ExpressionStore};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{ExpressionTree, NodeId};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);

    match command {
        Commands::Show => {
            output::tree(open_store(cli, &settings).tree());
            Ok(())
        }
        Commands::Apply {
            edits,
            strict,
            each,
        } => apply(open_store(cli, &settings), edits, *strict, *each),
        Commands::CanAccept { dragged, target } => {
            let store = open_store(cli, &settings);
            let accepted = store.can_accept(&NodeId::from(dragged.as_str()), &NodeId::from(target.as_str()));
            output::verdict(&format!("{} onto {}", dragged, target), accepted);
            Ok(())
        }
        Commands::Config { command } => config(command, &settings),
        Commands::Completion { .. } => Ok(()),
    }
}

fn open_store(cli: &Cli, settings: &Settings) -> ExpressionStore {
    if cli.empty {
        ExpressionStore::with_empty_root(settings)
    } else {
        ExpressionStore::new(ExpressionTree::sample(), settings)
    }
}

#[instrument(skip(store))]
fn apply(mut store: ExpressionStore, edits: &[EditCommand], strict: bool, each: bool) -> CliResult<()> {
    if each {
        store.subscribe(output::tree);
    }

    output::header("Edits");
    for edit in edits {
        let outcome = store.apply(edit);
        output::edit(edit, &outcome);
        if strict {
            outcome.into_result()?;
        }
    }

    output::header("Result");
    output::tree(store.tree());
    Ok(())
}

fn config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::plain(&settings.to_toml()?),
        ConfigCommands::Template => output::plain(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::plain(&path.display()),
            None => {
                return Err(CliError::Usage(
                    "cannot determine config directory".to_string(),
                ))
            }
        },
    }
    Ok(())
}
