//! Hookrelay CLI
//!
//! The `hookrelay` command runs webhook payloads through the normalization
//! pipeline offline, one JSON document per invocation (or one per line).
//!
//! ## Commands
//!
//! - `classify`: infer the action name and event key
//! - `reduce`: project a payload onto its canonical record
//! - `dispatch`: classify, reduce, gate and publish to an in-memory bus
//! - `flatten` / `unflatten` / `strip`: the flatten utility
//! - `validate-package`: provenance check for a package-publish payload

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing::{info, warn, Level};

use hookrelay_core::{
    evaluate_package, flatten, strip_fields_by_key_markers, try_reduce, unflatten,
    CanonicalPayload, Classifier, DispatchOutcome, Dispatcher, FlattenOptions, KeyStrategy,
    LogFormat, MemoryEventBus, RelayConfig, UnflattenOptions, METRICS,
};

#[derive(Parser)]
#[command(name = "hookrelay")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Normalize source-host webhooks into canonical events", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Relay configuration file (TOML)
    #[arg(long, global = true, env = "HOOKRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the provider prefix of event names
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Override how the event key is chosen
    #[arg(long, global = true, value_enum)]
    key_strategy: Option<StrategyArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    FirstField,
    Discriminator,
}

impl From<StrategyArg> for KeyStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FirstField => KeyStrategy::FirstField,
            StrategyArg::Discriminator => KeyStrategy::Discriminator,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Infer (actionName, eventKey) for a payload
    Classify {
        /// Payload file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// Reduce a payload to its canonical record (`null` when unhandled)
    Reduce {
        /// Payload file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Event key to reduce with (default: classify the payload)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Route payloads end to end and print what reached the bus
    Dispatch {
        /// Payload file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Treat input as newline-delimited payloads
        #[arg(long)]
        lines: bool,
    },

    /// Flatten a document into delimiter-joined paths
    Flatten {
        /// Document file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        #[arg(short, long, default_value = ".")]
        delimiter: String,

        /// Stop descending at this depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Keep arrays as leaves
        #[arg(long)]
        safe: bool,
    },

    /// Rebuild a nested document from delimiter-joined paths
    Unflatten {
        /// Document file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        #[arg(short, long, default_value = ".")]
        delimiter: String,

        /// Never build arrays from numeric segments
        #[arg(long)]
        object: bool,

        /// Let deeper keys replace scalars already written
        #[arg(long)]
        overwrite: bool,
    },

    /// Remove every field whose path contains a marker
    Strip {
        /// Document file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Substring to match against full field paths (repeatable)
        #[arg(short, long = "marker", required = true)]
        markers: Vec<String>,

        /// Path delimiter (default: the configured delimiter)
        #[arg(short, long)]
        delimiter: Option<String>,
    },

    /// Check a package-publish payload's URL against its own provenance
    ValidatePackage {
        /// Payload file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    hookrelay_core::init_tracing(format, level);

    let config = resolve_config(
        cli.config.as_deref(),
        cli.provider.as_deref(),
        cli.key_strategy,
    )?;

    let result = match cli.command {
        Commands::Classify { input } => cmd_classify(&config, &input),
        Commands::Reduce { input, key } => cmd_reduce(&config, &input, key.as_deref()),
        Commands::Dispatch { input, lines } => cmd_dispatch(config, &input, lines).await,
        Commands::Flatten {
            input,
            delimiter,
            max_depth,
            safe,
        } => cmd_flatten(&input, &delimiter, max_depth, safe),
        Commands::Unflatten {
            input,
            delimiter,
            object,
            overwrite,
        } => cmd_unflatten(&input, &delimiter, object, overwrite),
        Commands::Strip {
            input,
            markers,
            delimiter,
        } => cmd_strip(&input, &markers, delimiter.as_deref().unwrap_or(&config.delimiter)),
        Commands::ValidatePackage { input } => cmd_validate_package(&input),
    };

    METRICS.flush();
    result
}

/// Load `path` (or defaults) and apply flag overrides.
fn resolve_config(
    path: Option<&Path>,
    provider: Option<&str>,
    strategy: Option<StrategyArg>,
) -> Result<RelayConfig> {
    let mut config = match path {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RelayConfig::default(),
    };
    if let Some(provider) = provider {
        config = config.with_provider(provider);
    }
    if let Some(strategy) = strategy {
        config = config.with_key_strategy(strategy.into());
    }
    config.validate().context("Invalid relay configuration")?;
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_document(path: &Path) -> Result<Value> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

/// Parse newline-delimited payloads, skipping blank and malformed lines.
fn parse_lines(content: &str) -> Vec<Value> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str(line) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(line = i + 1, error = %err, "skipping malformed payload");
                None
            }
        })
        .collect()
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn classify_document(config: &RelayConfig, raw: &Value) -> Result<Value> {
    let classification = Classifier::new(config.key_strategy).classify(raw);
    Ok(serde_json::to_value(classification)?)
}

fn reduce_document(config: &RelayConfig, raw: &Value, key: Option<&str>) -> Result<Value> {
    let key = match key {
        Some(key) => key.to_string(),
        None => Classifier::new(config.key_strategy)
            .classify(raw)
            .event_key
            .unwrap_or_default(),
    };
    match try_reduce(&key, raw) {
        Ok(payload) => Ok(payload.to_value()?),
        Err(err) => {
            info!(event_key = %key, reason = %err, "payload not reduced");
            Ok(Value::Null)
        }
    }
}

fn package_verdict(raw: &Value) -> Result<(bool, Value)> {
    let payload = try_reduce("package", raw).context("Not a package-publish payload")?;
    let CanonicalPayload::Package(descriptor) = payload else {
        bail!("Not a package-publish payload");
    };
    let verdict = evaluate_package(&descriptor);
    let report = json!({
        "passed": verdict.passed,
        "expected": verdict.expected,
        "actual": verdict.actual,
        "package": serde_json::to_value(&descriptor)?,
    });
    Ok((verdict.passed, report))
}

fn strip_document(doc: &Value, markers: &[String], delimiter: &str) -> Result<Value> {
    if delimiter.is_empty() {
        bail!("Delimiter must not be empty");
    }
    Ok(strip_fields_by_key_markers(doc, markers, delimiter))
}

/// Infer (actionName, eventKey)
fn cmd_classify(config: &RelayConfig, input: &Path) -> Result<()> {
    let raw = read_document(input)?;
    print_json(&classify_document(config, &raw)?)
}

/// Reduce one payload
fn cmd_reduce(config: &RelayConfig, input: &Path, key: Option<&str>) -> Result<()> {
    let raw = read_document(input)?;
    print_json(&reduce_document(config, &raw, key)?)
}

/// Dispatch payloads through an in-memory bus
async fn cmd_dispatch(config: RelayConfig, input: &Path, lines: bool) -> Result<()> {
    let payloads = if lines {
        parse_lines(&read_input(input)?)
    } else {
        vec![read_document(input)?]
    };

    let bus = Arc::new(MemoryEventBus::new());
    let dispatcher = Dispatcher::new(Arc::clone(&bus), config);

    for raw in &payloads {
        match dispatcher.dispatch(raw).await {
            Ok(DispatchOutcome::Published { name, digest }) => {
                info!(event_name = %name, digest = %digest, "published")
            }
            Ok(outcome) => info!(event_name = %outcome.name(), ?outcome, "not published"),
            Err(err) => warn!(error = %err, "dispatch failed"),
        }
    }

    let events = bus.events().await;
    print_json(&serde_json::to_value(events)?)
}

/// Flatten a document
fn cmd_flatten(input: &Path, delimiter: &str, max_depth: Option<usize>, safe: bool) -> Result<()> {
    let doc = read_document(input)?;
    let mut options = FlattenOptions::default()
        .with_delimiter(delimiter)
        .safe(safe);
    if let Some(max_depth) = max_depth {
        options = options.with_max_depth(max_depth);
    }
    print_json(&Value::Object(flatten(&doc, &options)))
}

/// Unflatten a document
fn cmd_unflatten(input: &Path, delimiter: &str, object: bool, overwrite: bool) -> Result<()> {
    let doc = read_document(input)?;
    let options = UnflattenOptions::default()
        .with_delimiter(delimiter)
        .object(object)
        .overwrite(overwrite);
    print_json(&unflatten(&doc, &options))
}

/// Strip marked fields
fn cmd_strip(input: &Path, markers: &[String], delimiter: &str) -> Result<()> {
    let doc = read_document(input)?;
    print_json(&strip_document(&doc, markers, delimiter)?)
}

/// Validate a package-publish payload; fails when the URL does not match
fn cmd_validate_package(input: &Path) -> Result<()> {
    let raw = read_document(input)?;
    let (passed, report) = package_verdict(&raw)?;
    print_json(&report)?;
    if !passed {
        bail!("Package URL does not match its provenance");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn package_payload(url: &str) -> Value {
        json!({
            "action": "published",
            "package": {
                "package_version": {
                    "version": "sha256:abc",
                    "target_commitish": "main",
                    "package_url": url
                },
                "registry": {"url": "https://ghcr.io"}
            },
            "repository": {"name": "svc", "owner": {"login": "acme"}}
        })
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hookrelay",
            "classify",
            "payload.json",
            "--json",
            "--key-strategy",
            "discriminator",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.key_strategy, Some(StrategyArg::Discriminator));
        assert!(matches!(cli.command, Commands::Classify { .. }));
    }

    #[test]
    fn test_strip_requires_marker() {
        assert!(Cli::try_parse_from(["hookrelay", "strip", "doc.json"]).is_err());
        let cli =
            Cli::try_parse_from(["hookrelay", "strip", "-m", "_url", "-m", "node_id"]).unwrap();
        let Commands::Strip {
            input,
            markers,
            delimiter,
        } = cli.command
        else {
            panic!("expected strip");
        };
        assert_eq!(input, PathBuf::from("-"));
        assert_eq!(markers, vec!["_url", "node_id"]);
        assert_eq!(delimiter, None);
    }

    #[test]
    fn test_strip_accepts_delimiter_like_flatten() {
        let cli = Cli::try_parse_from(["hookrelay", "strip", "-m", "_url", "--delimiter", "/"])
            .unwrap();
        let Commands::Strip { delimiter, .. } = cli.command else {
            panic!("expected strip");
        };
        assert_eq!(delimiter.as_deref(), Some("/"));
    }

    #[test]
    fn test_strip_document_uses_given_delimiter() {
        let doc = json!({"a.b": {"c_url": "x", "d": 1}});
        let markers = vec!["_url".to_string()];
        let out = strip_document(&doc, &markers, "/").unwrap();
        assert_eq!(out, json!({"a.b": {"d": 1}}));
        assert!(strip_document(&doc, &markers, "").is_err());
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = \"gitea\"\nemit_unhandled = true").unwrap();

        let config = resolve_config(Some(file.path()), None, None).unwrap();
        assert_eq!(config.provider, "gitea");
        assert!(config.emit_unhandled);

        let config = resolve_config(
            Some(file.path()),
            Some("forgejo"),
            Some(StrategyArg::Discriminator),
        )
        .unwrap();
        assert_eq!(config.provider, "forgejo");
        assert_eq!(config.key_strategy, KeyStrategy::Discriminator);
    }

    #[test]
    fn test_resolve_config_rejects_invalid_override() {
        let err = resolve_config(None, Some(""), None).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid relay configuration"));
    }

    #[test]
    fn test_parse_lines_skips_malformed() {
        let input = "{\"sender\":{\"login\":\"a\"}}\nnot json\n\n{\"zen\":\"hi\"}\n";
        let payloads = parse_lines(input);
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1]["zen"], "hi");
    }

    #[test]
    fn test_reduce_document_unhandled_is_null() {
        let out = reduce_document(&RelayConfig::default(), &json!({"foo": 1}), None).unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_reduce_document_with_explicit_key() {
        let raw = json!({"zen": "hi", "sender": {"login": "octocat"}});
        let out = reduce_document(&RelayConfig::default(), &raw, Some("sender")).unwrap();
        assert_eq!(out["login"], "octocat");
    }

    #[test]
    fn test_classify_document_shape() {
        let out =
            classify_document(&RelayConfig::default(), &json!({"forkee": {"id": 1}})).unwrap();
        assert_eq!(out, json!({"action_name": "forked", "event_key": "forkee"}));
    }

    #[test]
    fn test_package_verdict_reports_expected_url() {
        let (passed, report) = package_verdict(&package_payload("ghcr.io/acme/svc:main")).unwrap();
        assert!(passed);
        assert_eq!(report["expected"], "ghcr.io/acme/svc:main");

        let (passed, report) = package_verdict(&package_payload("ghcr.io/other/svc:main")).unwrap();
        assert!(!passed);
        assert_eq!(report["actual"], "ghcr.io/other/svc:main");
    }

    #[test]
    fn test_package_verdict_rejects_non_package() {
        let err = package_verdict(&json!({"sender": {"login": "a"}})).unwrap_err();
        assert!(format!("{err:#}").contains("Not a package-publish payload"));
    }

    #[test]
    fn test_read_document_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }
}
