// src/cli/dispatcher.rs

use anyhow::{Result, anyhow};

use crate::{CancellationToken, cli::handlers};

/// A command, its aliases and its handler. Handlers receive the arguments
/// after the command name.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &CancellationToken) -> Result<()>,
}

/// Every command goshim understands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "references",
        aliases: &["refs"],
        handler: handlers::references::handle,
    },
    CommandDefinition {
        name: "rename",
        aliases: &[],
        handler: handlers::rename::handle,
    },
    CommandDefinition {
        name: "translate",
        aliases: &["tr"],
        handler: handlers::translate::handle,
    },
    CommandDefinition {
        name: "exec",
        aliases: &[],
        handler: handlers::exec::handle,
    },
    CommandDefinition {
        name: "install",
        aliases: &[],
        handler: handlers::install::handle,
    },
    CommandDefinition {
        name: "config",
        aliases: &[],
        handler: handlers::config::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMAND_REGISTRY.iter().map(|cmd| cmd.name)
}

/// Routes `goshim <command> [args...]` to the command's handler.
pub fn dispatch(all_args: Vec<String>, cancel: &CancellationToken) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let mut args = all_args.into_iter();
    let Some(name) = args.next() else {
        println!("{}", t!("dispatch.info.no_command"));
        return Ok(());
    };

    let command = find_command(&name).ok_or_else(|| {
        let known: Vec<&str> = command_names().collect();
        anyhow!(
            t!("dispatch.error.unknown_command"),
            name = name,
            known = known.join(", ")
        )
    })?;
    (command.handler)(args.collect(), cancel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_command_by_name_and_alias() {
        assert_eq!(find_command("references").map(|c| c.name), Some("references"));
        assert_eq!(find_command("refs").map(|c| c.name), Some("references"));
        assert_eq!(find_command("tr").map(|c| c.name), Some("translate"));
        assert!(find_command("start").is_none());
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        let result = dispatch(vec!["frobnicate".to_string()], &CancellationToken::new());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("frobnicate"));
        assert!(message.contains("references"));
    }

    #[test]
    fn test_no_command_is_not_an_error() {
        assert!(dispatch(Vec::new(), &CancellationToken::new()).is_ok());
    }

    #[test]
    fn test_registry_names_are_unique() {
        let mut names: Vec<&str> = COMMAND_REGISTRY
            .iter()
            .flat_map(|cmd| std::iter::once(cmd.name).chain(cmd.aliases.iter().copied()))
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
