#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

use anyhow::{Context, Result};
use colored::Colorize;
use cprepro::config::PreprocessorConfig;
use cprepro::driver::Driver;
use cprepro::io::{FsLineSource, StdinLineSource};
use std::io::Write;
use std::process::ExitCode;

/// Single-dash, GCC-flavored flag set (SPEC_FULL §6.1). Parsing is
/// hand-rolled over `std::env::args()`, argument-at-a-time, the way
/// `CPrePro::process_args`/`process_option` walk `argv` — these flags
/// don't map cleanly onto a derive-macro CLI parser.
struct Invocation {
    config: PreprocessorConfig,
    inputs: Vec<String>,
    output: Option<String>,
    use_stdin: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Invocation> {
    let mut config = PreprocessorConfig::new();
    let mut inputs = Vec::new();
    let mut output = None;
    let mut use_stdin = false;

    while let Some(arg) = args.next() {
        if let Some(def) = arg.strip_prefix("-D") {
            match def.split_once('=') {
                Some((name, value)) => config = config.with_define(name, value),
                None => config = config.with_define(def, ""),
            }
        } else if let Some(dir) = arg.strip_prefix("-I") {
            config = config.with_user_include_dir(dir);
        } else if arg == "-o" {
            let path = args.next().context("-o requires a file path")?;
            output = Some(path);
        } else if arg == "-stdin" {
            use_stdin = true;
        } else if arg == "-no_blank_lines" {
            config = config.no_blank_lines(true);
        } else if arg == "-echo" {
            config = config.echo(true);
        } else if arg == "-debug" {
            config = config.debug(true);
        } else if arg == "-quiet" {
            config = config.quiet(true);
        } else if arg == "-skip_std" {
            config = config.skip_std(true);
        } else if arg == "-list_includes" {
            config = config.list_includes(true);
        } else {
            inputs.push(arg);
        }
    }

    Ok(Invocation {
        config,
        inputs,
        output,
        use_stdin,
    })
}

fn use_color() -> bool {
    atty::is(atty::Stream::Stderr)
}

fn warn(message: &str) {
    if use_color() {
        eprintln!("{}", message.yellow());
    } else {
        eprintln!("{message}");
    }
}

fn run() -> Result<()> {
    let invocation = parse_args(std::env::args().skip(1))?;
    let list_includes = invocation.config.list_includes;
    let mut driver = Driver::new(invocation.config);
    let mut combined = String::new();

    if invocation.use_stdin || invocation.inputs.is_empty() {
        let mut source = StdinLineSource;
        combined.push_str(&driver.process("<stdin>", &mut source)?);
    }

    for path in &invocation.inputs {
        let mut source = FsLineSource::new(path.clone());
        combined.push_str(&driver.process(path, &mut source).with_context(|| format!("processing {path}"))?);
    }

    match invocation.output {
        Some(path) => {
            std::fs::write(&path, combined).with_context(|| format!("writing output to {path}"))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(combined.as_bytes()).context("writing output to stdout")?;
        }
    }

    if list_includes {
        if let Some(tree) = driver.include_tree() {
            eprint!("{}", tree.render());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Per the error-handling design, a directive-level problem never aborts
    // a run; only a process-level failure (an input file that can't be
    // opened, an output path that can't be written) does, and even then
    // the exit code stays informational rather than propagating a panic.
    if let Err(e) = run() {
        warn(&format!("cprepro: {e:#}"));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defines_include_dirs_and_flags() {
        let inv = parse_args(
            vec![
                "-DFOO=1",
                "-DBAR",
                "-Iinclude",
                "-o",
                "out.c",
                "-no_blank_lines",
                "-echo",
                "input.c",
            ]
            .into_iter()
            .map(String::from),
        )
        .expect("valid invocation");

        assert_eq!(inv.config.defines.get("FOO").map(String::as_str), Some("1"));
        assert_eq!(inv.config.defines.get("BAR").map(String::as_str), Some(""));
        assert_eq!(inv.config.user_include_dirs, vec!["include".to_string()]);
        assert_eq!(inv.output, Some("out.c".to_string()));
        assert!(inv.config.no_blank_lines);
        assert!(inv.config.echo);
        assert_eq!(inv.inputs, vec!["input.c".to_string()]);
    }

    #[test]
    fn missing_output_path_after_dash_o_is_an_error() {
        let result = parse_args(vec!["-o".to_string()].into_iter());
        assert!(result.is_err());
    }

    #[test]
    fn no_inputs_and_no_stdin_flag_still_marks_stdin_eligible() {
        let inv = parse_args(std::iter::empty()).expect("valid invocation");
        assert!(inv.inputs.is_empty());
        assert!(!inv.use_stdin);
    }
}
