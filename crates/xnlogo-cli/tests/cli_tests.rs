//! CLI integration tests
//!
//! Commands run against sources written into temporary directories.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xnlogo_cli::{run, Cli, Outcome, XnlogoConfig};

const COUNTER: &str = r#"@agent
class Counter:
    count: int = 0

    def step(self):
        self.count += 1
"#;

const RISKY: &str = r#"@agent
class Risky:
    energy: float = 1.0

    def act(self):
        try:
            self.energy = 0
        finally:
            pass
"#;

struct Captured {
    outcome: Outcome,
    out: String,
    err: String,
}

fn write_source(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path
}

fn invoke(args: &[&str], config: &XnlogoConfig) -> Captured {
    let cli = Cli::try_parse_from(std::iter::once("xnlogo").chain(args.iter().copied())).unwrap();
    let mut out = Vec::new();
    let mut err = Vec::new();
    let outcome = run(&cli.command, config, &mut out, &mut err).unwrap();
    Captured {
        outcome,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// check
// =============================================================================

#[test]
fn test_check_clean_source() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "counter.py", COUNTER);

    let result = invoke(&["check", path_arg(&source)], &XnlogoConfig::default());
    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.out, "No problems found\n");
}

#[test]
fn test_check_reports_warning_with_location() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "risky.py", RISKY);

    let result = invoke(&["check", path_arg(&source)], &XnlogoConfig::default());
    assert_eq!(result.outcome, Outcome::Success);
    assert!(result.out.contains("warning[W100] 6:9:"));
    assert!(result.out.ends_with("0 error(s), 1 warning(s)\n"));
}

#[test]
fn test_check_strict_fails() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "risky.py", RISKY);

    let result = invoke(&["check", path_arg(&source), "--strict"], &XnlogoConfig::default());
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.outcome.exit_code(), 1);
    assert!(result.out.contains("error[W100]"));
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "broken.py", "@agent\nclass Broken\n");

    let result = invoke(&["check", path_arg(&source), "--json"], &XnlogoConfig::default());
    assert_eq!(result.outcome, Outcome::Failed);

    let json: serde_json::Value = serde_json::from_str(&result.out).unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["severity"], "error");
}

#[test]
fn test_check_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.py");
    let cli = Cli::try_parse_from(["xnlogo", "check", path_arg(&missing)]).unwrap();

    let err = run(
        &cli.command,
        &XnlogoConfig::default(),
        &mut Vec::<u8>::new(),
        &mut Vec::<u8>::new(),
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("Failed to read"));
}

// =============================================================================
// build
// =============================================================================

#[test]
fn test_build_writes_next_to_source() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "counter.py", COUNTER);

    let result = invoke(&["build", path_arg(&source)], &XnlogoConfig::default());
    let expected = dir.path().join("counter.nlogox");
    assert_eq!(result.outcome, Outcome::Written(expected.clone()));
    assert_eq!(
        result.out,
        format!("Artifact written to {}\n", expected.display())
    );

    let document = fs::read_to_string(&expected).unwrap();
    assert!(document.contains("<code><![CDATA[turtles-own [count]"));
    assert!(document.contains(">setup</button>"));
}

#[test]
fn test_build_code_format_into_output_dir() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "counter.py", COUNTER);
    let out_dir = dir.path().join("nested").join("out");

    let result = invoke(
        &[
            "build",
            path_arg(&source),
            "--format",
            "code",
            "--output-dir",
            path_arg(&out_dir),
        ],
        &XnlogoConfig::default(),
    );
    let expected = out_dir.join("counter.nls");
    assert_eq!(result.outcome, Outcome::Written(expected.clone()));

    let code = fs::read_to_string(&expected).unwrap();
    assert!(code.starts_with("turtles-own [count]\n"));
    assert!(code.contains("to counter-step\n  set count (count + 1)\nend"));
}

#[test]
fn test_build_with_attachments_and_config_format() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "counter.py", COUNTER);
    let info = write_source(&dir, "info.md", "## WHAT IS IT?\nA counter.");
    let widget = write_source(&dir, "monitor.txt", "MONITOR\n10\n60\n100\n110\ncount");

    let config = XnlogoConfig {
        format: xnlogo_compiler::ContainerFormat::Nlogo,
        ..XnlogoConfig::default()
    };
    let result = invoke(
        &[
            "build",
            path_arg(&source),
            "--info",
            path_arg(&info),
            "--widget",
            path_arg(&widget),
            "--no-default-widgets",
        ],
        &config,
    );
    let expected = dir.path().join("counter.nlogo");
    assert_eq!(result.outcome, Outcome::Written(expected.clone()));

    let document = fs::read_to_string(&expected).unwrap();
    let sections: Vec<&str> = document.split("\n@#$#@#$#@\n").collect();
    assert!(!sections[1].contains("BUTTON"));
    assert!(sections[1].ends_with("MONITOR\n10\n60\n100\n110\ncount"));
    assert_eq!(sections[2], "## WHAT IS IT?\nA counter.");
}

#[test]
fn test_build_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "risky.py", RISKY);

    let result = invoke(&["build", path_arg(&source), "--strict"], &XnlogoConfig::default());
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.out.is_empty());
    assert!(result.err.contains("error[W100]"));
    assert!(!dir.path().join("risky.nlogox").exists());
}

#[test]
fn test_build_prints_warnings() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "risky.py", RISKY);

    let result = invoke(&["build", path_arg(&source)], &XnlogoConfig::default());
    assert_eq!(
        result.outcome,
        Outcome::Written(dir.path().join("risky.nlogox"))
    );
    assert!(result.err.contains("warning[W100]"));
}

// =============================================================================
// inspect
// =============================================================================

#[test]
fn test_inspect_yaml_and_json() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "counter.py", COUNTER);

    let yaml = invoke(&["inspect", path_arg(&source)], &XnlogoConfig::default());
    assert_eq!(yaml.outcome, Outcome::Success);
    assert!(yaml.out.contains("identifier: Counter"));

    let json = invoke(&["inspect", path_arg(&source), "--json"], &XnlogoConfig::default());
    let value: serde_json::Value = serde_json::from_str(&json.out).unwrap();
    assert_eq!(value["agents"][0]["identifier"], "Counter");
    assert_eq!(value["agents"][0]["state_fields"][0]["name"], "count");
}

#[test]
fn test_inspect_reports_structural_errors() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "helpers.py", "def helper():\n    return 1\n");

    let result = invoke(&["inspect", path_arg(&source)], &XnlogoConfig::default());
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.out.is_empty());
    assert!(result.err.contains("error[E100]"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xnlogo.toml");
    fs::write(
        &path,
        "strict = true\nformat = \"code\"\ndefault_widgets = false\noutput_dir = \"build\"\n",
    )
    .unwrap();

    let config = XnlogoConfig::from_file(&path).unwrap();
    assert!(config.strict);
    assert_eq!(config.format, xnlogo_compiler::ContainerFormat::Code);
    assert!(!config.default_widgets);
    assert_eq!(config.output_dir, Some(PathBuf::from("build")));
    assert_eq!(config.log_level, "warn");
}

#[test]
fn test_config_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xnlogo.toml");
    fs::write(&path, "format = \"xml\"\n").unwrap();

    assert!(XnlogoConfig::from_file(&path).is_err());
}
