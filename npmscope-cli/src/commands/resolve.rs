//! `npmscope resolve`: build the dependency graph of a package.json.

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use npmscope::graph::{GraphSnapshot, NodeStatus, Progress};
use npmscope::manifest::{parse_root_manifest, PackageManifest};
use npmscope::registry::{AsyncReqwestClient, ManifestSource, RegistryClient};
use npmscope::resolver::{ExpandOutcome, Orchestrator, ResolverConfig, TraversalMode};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::CliError;
use crate::render;
use crate::runner::CliRunner;

/// Arguments for the resolve command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Path to package.json (or its directory); '-' reads from stdin
    pub manifest: String,

    /// Follow devDependencies
    #[arg(long)]
    pub dev: bool,

    /// How many levels below the root to preload (overrides config)
    #[arg(long, value_name = "N")]
    pub depth: Option<usize>,

    /// Concurrent registry fetches (overrides config)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Load direct dependencies only; use --expand to open packages
    #[arg(long)]
    pub lazy: bool,

    /// Load the dependencies of a package (repeatable)
    #[arg(long, value_name = "NAME")]
    pub expand: Vec<String>,

    /// Print the graph snapshot as JSON instead of a tree
    #[arg(long)]
    pub json: bool,

    /// Registry base URL (overrides config)
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Mirror debug logging to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl ResolveArgs {
    /// Applies command-line overrides on top of the configured resolver.
    fn resolver_config(&self, base: ResolverConfig) -> ResolverConfig {
        let mut config = base;
        if let Some(depth) = self.depth {
            config = config.with_max_depth(depth);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.dev {
            config = config.with_include_dev(true);
        }
        if self.lazy {
            config = config.with_mode(TraversalMode::Lazy);
        }
        config
    }
}

/// Run the resolve command.
pub fn run(args: ResolveArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("resolve");

    let text = read_manifest(&args.manifest)?;
    let root = parse_root_manifest(&text)?;

    let config = runner.config();
    let resolver_config = args.resolver_config(config.resolver_config());
    let registry_url = args
        .registry
        .clone()
        .unwrap_or_else(|| config.registry.url.clone());

    let http = AsyncReqwestClient::with_timeout(config.registry.timeout_secs)?;
    let source = Arc::new(RegistryClient::new(http, registry_url.as_str()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let show_progress = !args.verbose && io::stderr().is_terminal();
    let started = Instant::now();
    let snapshot = runtime.block_on(resolve_graph(
        source,
        resolver_config,
        root,
        &args.expand,
        show_progress,
    ));
    let elapsed_ms = started.elapsed().as_millis();

    let summary = render::summary(&snapshot, elapsed_ms);
    info!(registry = %registry_url, "{}", summary);

    if args.json {
        println!("{}", render::render_json(&snapshot)?);
        eprintln!("{}", summary);
    } else {
        print!("{}", render::render_tree(&snapshot));
        println!();
        println!("{}", summary);
    }

    Ok(())
}

/// Reads the manifest from stdin, a file, or a directory's package.json.
fn read_manifest(arg: &str) -> Result<String, CliError> {
    if arg == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|error| CliError::ManifestRead {
                path: "<stdin>".to_string(),
                error,
            })?;
        return Ok(text);
    }

    let path = manifest_path(Path::new(arg));
    std::fs::read_to_string(&path).map_err(|error| CliError::ManifestRead {
        path: path.display().to_string(),
        error,
    })
}

fn manifest_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join("package.json")
    } else {
        path.to_path_buf()
    }
}

/// Runs a session to idle, then opens each requested package.
async fn resolve_graph<S: ManifestSource>(
    source: Arc<S>,
    config: ResolverConfig,
    root: PackageManifest,
    expand: &[String],
    show_progress: bool,
) -> Arc<GraphSnapshot> {
    let mut orchestrator = Orchestrator::new(source, config);
    let reporter =
        show_progress.then(|| tokio::spawn(report_progress(orchestrator.subscribe_progress())));

    orchestrator.analyze(root);
    let mut snapshot = orchestrator.run_until_idle().await;

    for name in expand {
        match orchestrator.expand(name) {
            ExpandOutcome::Unknown => warn!(package = %name, "Cannot expand unknown package"),
            ExpandOutcome::NotExpandable => warn!(package = %name, "Cannot expand failed package"),
            ExpandOutcome::Expanded => {
                // Fetch the stubs that were just materialized.
                for stub in unseen_children(&orchestrator.snapshot(), name) {
                    orchestrator.expand(&stub);
                }
            }
            _ => {}
        }
        snapshot = orchestrator.run_until_idle().await;
    }

    // Closing the progress channel ends the reporter.
    drop(orchestrator);
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }

    snapshot
}

/// Names of the unfetched children of `name`.
fn unseen_children(snapshot: &GraphSnapshot, name: &str) -> Vec<String> {
    snapshot
        .children(name)
        .into_iter()
        .filter(|child| child.status == NodeStatus::Unseen)
        .map(|child| child.name.clone())
        .collect()
}

/// Prints progress updates to stderr until the channel closes.
async fn report_progress(mut rx: watch::Receiver<Progress>) {
    let mut stderr = io::stderr();
    while rx.changed().await.is_ok() {
        let progress = rx.borrow_and_update().clone();
        if progress.is_idle() {
            let _ = write!(stderr, "\r\x1b[K");
        } else {
            let _ = write!(
                stderr,
                "\r\x1b[K[{}/{}] level {} {}",
                progress.current,
                progress.total,
                progress.level,
                progress.current_package.as_deref().unwrap_or("")
            );
        }
        let _ = stderr.flush();
    }
    let _ = write!(stderr, "\r\x1b[K");
    let _ = stderr.flush();
}
