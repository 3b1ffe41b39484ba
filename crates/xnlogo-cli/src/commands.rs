//! Subcommand implementations
//!
//! Each command reads its source file, drives the compiler and writes its
//! report to `out`. Diagnostics that accompany another result go to `err`.

use crate::cli::{BuildArgs, CheckArgs, Command, InspectArgs};
use crate::config::XnlogoConfig;
use crate::error::{CliError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xnlogo_compiler::{Attachments, Compiler, CompilerOptions};
use xnlogo_core::Diagnostics;

/// How a command finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report beyond warnings
    Success,
    /// A model file was written
    Written(PathBuf),
    /// At least one error-severity diagnostic
    Failed,
}

impl Outcome {
    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success | Outcome::Written(_) => 0,
            Outcome::Failed => 1,
        }
    }
}

/// Run one subcommand
pub fn run(
    command: &Command,
    config: &XnlogoConfig,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome> {
    match command {
        Command::Check(args) => check(args, config, out),
        Command::Build(args) => build(args, config, out, err),
        Command::Inspect(args) => inspect(args, config, out, err),
    }
}

/// Validate a model and print every diagnostic
pub fn check(args: &CheckArgs, config: &XnlogoConfig, out: &mut dyn Write) -> Result<Outcome> {
    let source = read_file(&args.file)?;
    let compiler = Compiler::with_options(args.options(config));

    info!("Checking {}", args.file.display());
    let diagnostics = compiler.validate(&source);
    debug!(
        "{} error(s), {} warning(s)",
        diagnostics.error_count(),
        diagnostics.warning_count()
    );

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&diagnostics)?)?;
    } else {
        print_diagnostics(out, &args.file, &diagnostics)?;
        writeln!(out, "{}", summary(&diagnostics))?;
    }

    Ok(if diagnostics.has_errors() {
        Outcome::Failed
    } else {
        Outcome::Success
    })
}

/// Compile a model and write its model file
pub fn build(
    args: &BuildArgs,
    config: &XnlogoConfig,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome> {
    let settings = args.settings(config);
    let source = read_file(&args.file)?;
    let compiler = Compiler::with_options(args.options(config));

    info!("Compiling {} to {}", args.file.display(), settings.format);
    let program = match compiler.compile(&source) {
        Ok(program) => program,
        Err(failure) => {
            print_diagnostics(err, &args.file, &failure.diagnostics)?;
            writeln!(err, "{}", summary(&failure.diagnostics))?;
            warn!("No artifact written for {}", args.file.display());
            return Ok(Outcome::Failed);
        }
    };
    print_diagnostics(err, &args.file, &program.diagnostics)?;

    let attachments = Attachments {
        widgets: args
            .widgets
            .iter()
            .map(|path| read_file(path))
            .collect::<Result<Vec<_>>>()?,
        info: args.info.as_deref().map(read_file).transpose()?,
        default_widgets: settings.default_widgets,
    };
    let document = program.render(&attachments, settings.format);

    let dir = settings.output_dir_for(&args.file);
    let path = artifact_path(&dir, &args.file, settings.format.extension());
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(&dir).map_err(|source| CliError::Write {
            path: dir.clone(),
            source,
        })?;
    }
    fs::write(&path, document).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;

    writeln!(out, "Artifact written to {}", path.display())?;
    Ok(Outcome::Written(path))
}

/// Print the intermediate representation of a model
pub fn inspect(
    args: &InspectArgs,
    config: &XnlogoConfig,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome> {
    let source = read_file(&args.file)?;
    let compiler = Compiler::with_options(CompilerOptions {
        strict: config.strict,
    });

    let (model, diagnostics) = match compiler.build_model(&source) {
        Ok(built) => built,
        Err(failure) => {
            print_diagnostics(err, &args.file, &failure.diagnostics)?;
            return Ok(Outcome::Failed);
        }
    };
    print_diagnostics(err, &args.file, &diagnostics)?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&model)?)?;
    } else {
        write!(out, "{}", serde_yaml::to_string(&model)?)?;
    }
    Ok(Outcome::Success)
}

/// `<dir>/<source stem>.<extension>`
pub fn artifact_path(dir: &Path, source: &Path, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    dir.join(format!("{}.{}", stem, extension))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn print_diagnostics(out: &mut dyn Write, file: &Path, diagnostics: &Diagnostics) -> Result<()> {
    for diagnostic in diagnostics {
        writeln!(out, "{}: {}", file.display(), diagnostic)?;
    }
    Ok(())
}

fn summary(diagnostics: &Diagnostics) -> String {
    if diagnostics.is_empty() {
        "No problems found".to_string()
    } else {
        format!(
            "{} error(s), {} warning(s)",
            diagnostics.error_count(),
            diagnostics.warning_count()
        )
    }
}
