// src/cli/handlers/translate.rs

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::{
    CancellationToken,
    system::path_translator::{self, PathForm},
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// `/mnt/c/...` to `C:\...`
    Native,
    /// `C:\...` to `/mnt/c/...`
    Alternate,
}

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Converts paths between the Windows form and the WSL /mnt form."
)]
struct TranslateArgs {
    /// Paths to convert. Anything that is not a drive path is printed unchanged.
    #[arg(required = true)]
    paths: Vec<String>,
    /// Force a direction. By default each path is converted to the other form.
    #[arg(long, value_enum)]
    to: Option<Direction>,
}

pub fn handle(args: Vec<String>, _cancel: &CancellationToken) -> Result<()> {
    let translate_args = TranslateArgs::try_parse_from(&args)?;
    for path in &translate_args.paths {
        println!("{}", translate(path, translate_args.to));
    }
    Ok(())
}

fn translate(path: &str, to: Option<Direction>) -> String {
    match to {
        Some(Direction::Native) => path_translator::to_native_form(path),
        Some(Direction::Alternate) => path_translator::to_alternate_form(path),
        None => match PathForm::classify(path) {
            form @ PathForm::Native { .. } => form.into_alternate(),
            form @ PathForm::Alternate { .. } => form.into_native(),
            PathForm::Plain(plain) => plain,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_direction() {
        assert_eq!(translate(r"C:\src\x.go", None), "/mnt/c/src/x.go");
        assert_eq!(translate("/mnt/d/go/y.go", None), r"D:\go\y.go");
        assert_eq!(translate("relative/z.go", None), "relative/z.go");
    }

    #[test]
    fn test_forced_direction_leaves_other_form_alone() {
        assert_eq!(translate("/mnt/c/a", Some(Direction::Alternate)), "/mnt/c/a");
        assert_eq!(translate(r"C:\a", Some(Direction::Native)), r"C:\a");
    }

    #[test]
    fn test_args_require_a_path() {
        assert!(TranslateArgs::try_parse_from(Vec::<String>::new()).is_err());
        let parsed = TranslateArgs::try_parse_from(["--to", "native", "/mnt/c/a"]).unwrap();
        assert_eq!(parsed.to, Some(Direction::Native));
        assert_eq!(parsed.paths, vec!["/mnt/c/a"]);
    }
}
