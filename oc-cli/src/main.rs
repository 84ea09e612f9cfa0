//! `oc` -- the command-line front end (spec.md §6), grounded on
//! `vex-cli/src/main.rs`'s `clap::Parser` + `env_logger::init()` +
//! `anyhow::Result` shape, but with a flat flag surface (no subcommands)
//! matching spec.md's `oc [-D <name[=val]>]* [-ly@h] <file>` exactly.

mod cpp;
mod driver;
mod dumps;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// `oc [-D <name[=val]>]* [-ly@h] <file>` (spec.md §6). Help is handled
/// by hand (`-h` prints usage to stderr and exits 0, not clap's default
/// stdout-and-exit-0-with-a-generated-page behavior), so clap's own
/// `--help`/`-h` flag is disabled and folded back in as a plain boolean.
#[derive(Parser, Debug)]
#[command(name = "oc", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Forwarded to the preprocessor as `-D<define>`.
    #[arg(short = 'D', value_name = "name[=val]")]
    defines: Vec<String>,

    /// Enable lexer debug trace.
    #[arg(short = 'l')]
    lexer_trace: bool,

    /// Enable parser debug trace.
    #[arg(short = 'y')]
    parser_trace: bool,

    /// Implementation-reserved; accepted, ignored.
    #[arg(short = '@', hide = true)]
    reserved: bool,

    /// Print usage to stderr and exit 0.
    #[arg(short = 'h')]
    help: bool,

    /// The `.oc` source file to compile.
    #[arg(value_name = "file")]
    file: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("usage: oc [-D <name[=val]>]* [-ly@h] <file.oc>");
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            print_usage();
            return ExitCode::from(1);
        }
    };

    if cli.help {
        print_usage();
        return ExitCode::from(0);
    }

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("oc: {e}");
            ExitCode::from(1)
        }
    }
}

/// The remainder of spec.md §6's usage/I-O contract, separated from
/// `main` so the exit-code arithmetic reads in one place: a `.oc`-suffix
/// check, opening the file, invoking `cpp`, then handing off to
/// [`driver::run`] for the lex/parse/sema/emit pipeline proper.
fn run(cli: Cli) -> anyhow::Result<u8> {
    let Some(file) = cli.file else {
        print_usage();
        return Ok(1);
    };

    if file.extension().and_then(|e| e.to_str()) != Some("oc") {
        anyhow::bail!("file '{}' has a non-allowed file extension", file.display());
    }
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("file '{}' has no usable base name", file.display()))?
        .to_string();

    // spec.md §6: "test for access to input file" before spawning cpp.
    std::fs::metadata(&file).map_err(|e| anyhow::anyhow!("could not open input file '{}': {e}", file.display()))?;

    let source = cpp::preprocess(&file, &cli.defines)?;

    let out_dir = file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
    let opts = driver::RunOptions { lexer_trace: cli.lexer_trace, parser_trace: cli.parser_trace };
    let main_file_name = file.to_string_lossy().to_string();

    match driver::run(&source, &main_file_name, &stem, out_dir, &opts)? {
        driver::RunOutcome::Success => Ok(0),
        driver::RunOutcome::SemanticErrors(count) => {
            log::error!("{count} semantic error(s)");
            Ok(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_oc_extension() {
        let cli = Cli { defines: vec![], lexer_trace: false, parser_trace: false, reserved: false, help: false, file: Some(PathBuf::from("foo.txt")) };
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("non-allowed file extension"));
    }

    #[test]
    fn parses_flags_and_positional() {
        let cli = Cli::try_parse_from(["oc", "-Dfoo=1", "-l", "-y", "prog.oc"]).expect("parses");
        assert_eq!(cli.defines, vec!["foo=1".to_string()]);
        assert!(cli.lexer_trace);
        assert!(cli.parser_trace);
        assert_eq!(cli.file, Some(PathBuf::from("prog.oc")));
    }

    #[test]
    fn help_flag_is_recognized_without_clap_builtin_help() {
        let cli = Cli::try_parse_from(["oc", "-h"]).expect("parses");
        assert!(cli.help);
    }
}
