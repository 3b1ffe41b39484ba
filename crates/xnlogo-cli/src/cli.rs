//! Command-line arguments

use crate::config::XnlogoConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use xnlogo_compiler::{CompilerOptions, ContainerFormat};

#[derive(Parser, Debug)]
#[command(name = "xnlogo")]
#[command(version, about = "Compile Python agent-based models into NetLogo", long_about = None)]
pub struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a model and print its diagnostics
    Check(CheckArgs),
    /// Compile a model into a NetLogo model file
    Build(BuildArgs),
    /// Print the intermediate representation of a model
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Python source file
    pub file: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Print diagnostics as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Python source file
    pub file: PathBuf,

    /// Output container: nlogox, nlogo or code
    #[arg(long)]
    pub format: Option<ContainerFormat>,

    /// Directory for the artifact (defaults to the source file's directory)
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Leave out the setup and go buttons
    #[arg(long = "no-default-widgets")]
    pub no_default_widgets: bool,

    /// File whose contents become the model's info tab
    #[arg(long)]
    pub info: Option<PathBuf>,

    /// File holding one widget record to embed; may be repeated
    #[arg(long = "widget")]
    pub widgets: Vec<PathBuf>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Python source file
    pub file: PathBuf,

    /// Print JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn options(&self, config: &XnlogoConfig) -> CompilerOptions {
        CompilerOptions {
            strict: self.strict || config.strict,
        }
    }
}

impl BuildArgs {
    pub fn options(&self, config: &XnlogoConfig) -> CompilerOptions {
        CompilerOptions {
            strict: self.settings(config).strict,
        }
    }

    /// Merge flags over the loaded configuration
    pub fn settings(&self, config: &XnlogoConfig) -> XnlogoConfig {
        XnlogoConfig {
            strict: self.strict || config.strict,
            format: self.format.unwrap_or(config.format),
            default_widgets: config.default_widgets && !self.no_default_widgets,
            output_dir: self.output_dir.clone().or_else(|| config.output_dir.clone()),
            log_level: config.log_level.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "xnlogo",
            "build",
            "wolves.py",
            "--format",
            "nlogo",
            "--output-dir",
            "out",
            "--no-default-widgets",
            "--widget",
            "slider.txt",
            "--widget",
            "plot.txt",
        ])
        .unwrap();

        let Command::Build(args) = cli.command else {
            panic!("Expected build command");
        };
        assert_eq!(args.file, PathBuf::from("wolves.py"));
        assert_eq!(args.format, Some(ContainerFormat::Nlogo));
        assert_eq!(args.widgets.len(), 2);

        let settings = args.settings(&XnlogoConfig::default());
        assert_eq!(settings.format, ContainerFormat::Nlogo);
        assert_eq!(settings.output_dir, Some(PathBuf::from("out")));
        assert!(!settings.default_widgets);
    }

    #[test]
    fn test_flags_fall_back_to_config() {
        let cli = Cli::try_parse_from(["xnlogo", "build", "wolves.py"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("Expected build command");
        };

        let config = XnlogoConfig {
            strict: true,
            format: ContainerFormat::Code,
            ..XnlogoConfig::default()
        };
        let settings = args.settings(&config);
        assert!(settings.strict);
        assert!(args.options(&config).strict);
        assert_eq!(settings.format, ContainerFormat::Code);
        assert!(settings.default_widgets);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Cli::try_parse_from(["xnlogo", "build", "wolves.py", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_log_level() {
        let cli =
            Cli::try_parse_from(["xnlogo", "check", "wolves.py", "--json", "--log-level", "debug"])
                .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Check(CheckArgs { json: true, .. })));
    }
}
