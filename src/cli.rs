//! Command line: hash | inspect schemas in OpenAPI / JSON-Schema documents.
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use schema_graph::schema::hash::to_hex;
use schema_graph::{DynamicValue, HashCache, SchemaProxy, SpecIndex, SpecIndexConfig, SpecVersion, collect_errors};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build, hash and inspect the schemas of OpenAPI / JSON-Schema documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// log resolution activity to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print a structural digest for every selected schema
    Hash(HashOut),
    /// print the schema tree with references and nested build failures
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to a single schema (e.g. /components/schemas/Pet);
    /// defaults to every entry of components/schemas or definitions
    #[arg(long)]
    pointer: Option<String>,

    /// fail instead of resolving references that are part of a cycle
    #[arg(long, default_value_t = false)]
    deny_circular: bool,

    /// format version (2.0, 3.0, 3.1); detected from the document when omitted
    #[arg(long)]
    spec_version: Option<SpecVersion>,

    /// worker threads for building and hashing (rayon default when omitted)
    #[arg(long)]
    threads: Option<usize>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct HashOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// levels of nesting to print and check
    #[arg(long, default_value_t = 4)]
    depth: usize,
}

/// One input file, indexed, with the schemas selected from it.
struct LoadedDocument {
    path: PathBuf,
    index: Arc<SpecIndex>,
    schemas: Vec<(String, Arc<SchemaProxy>)>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn config(&self) -> SpecIndexConfig {
        SpecIndexConfig {
            allow_circular_references: !self.deny_circular,
            spec_version: self.spec_version,
            ..SpecIndexConfig::default()
        }
    }

    fn load(&self) -> anyhow::Result<Vec<LoadedDocument>> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut documents = Vec::with_capacity(source_paths.len());
        for path in source_paths {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read source file {}", path.display()))?;
            let root = schema_graph::parse_document(&source)
                .with_context(|| format!("failed to parse source file {}", path.display()))?;
            let index = Arc::new(SpecIndex::with_config(root, self.config()));
            let schemas = self.select_schemas(&index).with_context(|| format!("in {}", path.display()))?;
            tracing::debug!(path = %path.display(), count = schemas.len(), version = ?index.spec_version(), "document loaded");
            documents.push(LoadedDocument { path, index, schemas });
        }
        Ok(documents)
    }

    fn select_schemas(&self, index: &Arc<SpecIndex>) -> anyhow::Result<Vec<(String, Arc<SchemaProxy>)>> {
        if let Some(pointer) = &self.pointer {
            let reference = if pointer.starts_with('#') { pointer.clone() } else { format!("#{pointer}") };
            let Some(located) = index.locate(&reference) else {
                bail!("pointer {pointer} does not match any node");
            };
            let proxy = SchemaProxy::build(None, Some(located.node), Some(index.clone()))?;
            return Ok(vec![(reference, proxy)]);
        }
        for container in ["#/components/schemas", "#/definitions"] {
            if let Some(located) = index.locate(container) {
                if !located.node.is_mapping() {
                    bail!("{container} is not a mapping");
                }
                let schemas = located
                    .node
                    .entries()
                    .iter()
                    .map(|(key, value)| {
                        let name = format!("{container}/{}", key.key_label());
                        let proxy = SchemaProxy::new(Some(key.clone()), value.clone(), Some(index.clone()), Weak::new());
                        (name, proxy)
                    })
                    .collect();
                return Ok(schemas);
            }
        }
        let root = SchemaProxy::new(None, index.root().clone(), Some(index.clone()), Weak::new());
        Ok(vec![("#".to_string(), root)])
    }

    fn thread_pool(&self) -> anyhow::Result<Option<rayon::ThreadPool>> {
        let Some(threads) = self.threads else {
            return Ok(None);
        };
        if threads == 0 {
            bail!("--threads must be at least 1");
        }
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        Ok(Some(pool))
    }

    /// Run `job` on the configured pool, or the global one.
    fn install<R: Send>(&self, job: impl FnOnce() -> R + Send) -> anyhow::Result<R> {
        Ok(match self.thread_pool()? {
            Some(pool) => pool.install(job),
            None => job(),
        })
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        init_tracing(self.verbose);
        match &self.cmd {
            Command::Hash(target) => {
                let settings = &target.input_settings;
                let documents = settings.load()?;
                let cache = HashCache::new();
                let report = settings.install(|| hash_report(&documents, &cache))?;
                tracing::debug!(cached = cache.len(), "hashing done");
                let report_src = serde_json::to_string_pretty(&report)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &report_src).with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{report_src}");
                }
                Ok(())
            }
            Command::Inspect(target) => {
                let settings = &target.input_settings;
                let documents = settings.load()?;
                let report = settings.install(|| inspect_report(&documents, target.depth))?;
                print!("{report}");
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMMANDS
// ————————————————————————————————————————————————————————————————————————————

fn hash_report(documents: &[LoadedDocument], cache: &HashCache) -> Value {
    let mut report = Map::new();
    for document in documents {
        let digests: Vec<(String, String)> = document
            .schemas
            .par_iter()
            .map(|(name, proxy)| {
                let digest = proxy.hash_with(Some(cache));
                if let Some(error) = proxy.build_error() {
                    tracing::warn!(schema = %name, %error, "schema failed to build");
                }
                (name.clone(), to_hex(&digest))
            })
            .collect();
        let digests: Map<String, Value> = digests.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
        report.insert(document.path.display().to_string(), Value::Object(digests));
    }
    Value::Object(report)
}

fn inspect_report(documents: &[LoadedDocument], depth: usize) -> String {
    let mut out = String::new();
    for document in documents {
        let version = document.index.spec_version().map_or("unknown".to_string(), |v| v.to_string());
        let _ = writeln!(out, "{} (version {version})", document.path.display().to_string().bold());
        for reference in document.index.circular_references() {
            let _ = writeln!(out, "  {} {reference}", "circular".yellow());
        }
        for (name, proxy) in &document.schemas {
            let _ = writeln!(out, "  {}{}", name.bold(), describe(proxy, &document.index));
            print_tree(&mut out, proxy, &document.index, 2, depth);
            for issue in collect_errors(proxy, depth) {
                let path = if issue.path.is_empty() { name.clone() } else { format!("{name}/{}", issue.path) };
                let _ = writeln!(out, "    {} {path}: {}", "error".red().bold(), issue.error);
            }
        }
    }
    out
}

/// Children of `proxy`, one per line. References are shown, not followed.
fn print_tree(out: &mut String, proxy: &SchemaProxy, index: &SpecIndex, indent: usize, remaining: usize) {
    if remaining == 0 || proxy.is_reference() {
        return;
    }
    let Some(schema) = proxy.schema() else {
        return;
    };
    let pad = "  ".repeat(indent);
    for (label, child) in schema.sub_schemas() {
        let _ = writeln!(out, "{pad}{label}{}", describe(&child, index));
        print_tree(out, &child, index, indent + 1, remaining - 1);
    }
}

fn describe(proxy: &SchemaProxy, index: &SpecIndex) -> String {
    if let Some(reference) = proxy.reference() {
        let marker = if index.is_circular(&reference) { " (circular)".yellow().to_string() } else { String::new() };
        return format!(" → {}{marker}", reference.cyan());
    }
    match proxy.schema().and_then(|s| s.schema_type.clone()) {
        Some(DynamicValue::A(name)) => format!(" [{name}]"),
        Some(DynamicValue::B(names)) => format!(" [{}]", names.join(" | ")),
        None if proxy.build_error().is_some() => format!(" {}", "✗".red()),
        None => String::new(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "schema_graph=debug" } else { "warn" }));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // an explicit glob that matches nothing is a mistake, not an empty input
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pointer: Option<&str>) -> InputSettings {
        InputSettings {
            pointer: pointer.map(str::to_string),
            deny_circular: false,
            spec_version: None,
            threads: None,
            input: vec![],
        }
    }

    fn index(src: &str) -> Arc<SpecIndex> {
        Arc::new(SpecIndex::new(schema_graph::parse_document(src).unwrap()))
    }

    #[test]
    fn parses_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "schema-graph",
            "hash",
            "--spec-version",
            "3.1",
            "--deny-circular",
            "--threads",
            "2",
            "-i",
            "a.yaml",
            "b.yaml",
        ])
        .unwrap();
        let Command::Hash(target) = cli.cmd else { panic!("expected hash") };
        assert_eq!(target.input_settings.spec_version, Some(SpecVersion::OpenApi31));
        assert!(!target.input_settings.config().allow_circular_references);
        assert_eq!(target.input_settings.input, ["a.yaml", "b.yaml"]);
    }

    #[test]
    fn selects_component_schemas_in_order() {
        let index = index("openapi: 3.0.3\ncomponents:\n  schemas:\n    Zed: {}\n    Abe: {}\n");
        let names: Vec<String> = settings(None).select_schemas(&index).unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["#/components/schemas/Zed", "#/components/schemas/Abe"]);
    }

    #[test]
    fn selects_by_pointer_or_falls_back_to_the_root() {
        let index = index("definitions:\n  Pet: {type: object}\n");
        let picked = settings(Some("/definitions/Pet")).select_schemas(&index).unwrap();
        assert_eq!(picked[0].0, "#/definitions/Pet");
        assert!(settings(Some("/nope")).select_schemas(&index).is_err());

        let bare = self::index("type: string");
        assert_eq!(settings(None).select_schemas(&bare).unwrap()[0].0, "#");
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["spec.yaml"]).unwrap();
        assert_eq!(paths, [PathBuf::from("spec.yaml")]);
    }
}
