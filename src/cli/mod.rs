//! CLI module for resgraph.
//!
//! Commands:
//! - Build/Load: build, load, list
//! - Inspect: scan, stats
//! - Query: resolve, find, depends, deps
//! - Checks: missing, orphans, cycles, compliance

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{GraphConfig, STATE_DIR};
use crate::graph::{GraphNode, ResourceGraph};
use crate::pipeline::{
    analyze_repository, build_global_resource_graph, latest_artifact_id,
    load_global_resource_graph, Analysis,
};
use crate::resolver::{Resolution, ResolutionSummary};
use crate::scanner::Scanner;
use crate::store::{ArtifactStore, FileArtifactStore, JsonlEventStream};

#[derive(Parser, Debug)]
#[command(name = "resgraph")]
#[command(about = "Build and query a dependency graph of repository resources")]
#[command(version)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─── Build ────────────────────────────────────────────────────
    /// Build the global resource graph and store it as an artifact
    Build,

    /// Load a stored graph artifact (latest if no id is given)
    Load {
        /// Artifact id
        id: Option<String>,
    },

    /// List stored artifacts
    List,

    // ─── Inspect ──────────────────────────────────────────────────
    /// Scan the repository and classify every file
    Scan,

    /// Graph statistics and check summary
    Stats,

    // ─── Query ────────────────────────────────────────────────────
    /// Look up a resource by exact path
    Resolve {
        /// Root-relative path
        path: String,
    },

    /// Find resources whose path matches a pattern (`*` is a wildcard)
    Find {
        /// Path pattern, e.g. "src/*.ts"
        pattern: String,
    },

    /// Check whether one resource depends directly on another
    Depends { from: String, to: String },

    /// Dependencies and dependents of a resource
    Deps {
        /// Root-relative path
        path: String,
    },

    // ─── Checks ───────────────────────────────────────────────────
    /// Declared dependencies that do not name a resource in the graph
    Missing,

    /// Resources with no dependencies and no dependents
    Orphans,

    /// Dependency cycles
    Cycles,

    /// Resources without a semantic anchor
    Compliance,
}

/// Execute a parsed command, writing its report to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let root = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());
    let config = GraphConfig::load_for_root(&root);
    let state_dir = root.join(STATE_DIR);

    match &cli.command {
        Commands::Build => cmd_build(&root, &config, &state_dir, cli.json, out),
        Commands::Load { id } => cmd_load(&config, &state_dir, id.as_deref(), cli.json, out),
        Commands::List => cmd_list(&config, &state_dir, cli.json, out),
        Commands::Scan => cmd_scan(&root, &config, cli.json, out),
        query => {
            let analysis = analyze_repository(&root, &config)
                .with_context(|| format!("failed to analyse {}", root.display()))?;
            cmd_query(query, &analysis, cli.json, out)
        }
    }
}

fn artifact_store(config: &GraphConfig, state_dir: &Path) -> FileArtifactStore {
    FileArtifactStore::new(config.resolve_artifact_dir(state_dir))
}

// ─── Build / Load ─────────────────────────────────────────────────

fn cmd_build(
    root: &Path,
    config: &GraphConfig,
    state_dir: &Path,
    as_json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let store = artifact_store(config, state_dir);
    let events = JsonlEventStream::new(config.resolve_event_log(state_dir));
    let outcome = build_global_resource_graph(root, config, &store, &events)?;

    if as_json {
        return write_json(
            out,
            &json!({
                "artifactId": outcome.artifact_id,
                "version": outcome.graph.version,
                "statistics": outcome.graph.statistics,
                "summary": outcome.graph.resolutions.summary,
            }),
        );
    }

    writeln!(out, "Built global resource graph {}", outcome.artifact_id)?;
    writeln!(out, "Stored in {}", store.dir().display())?;
    write_summary(out, &outcome.graph.resolutions.summary)?;
    Ok(())
}

fn cmd_load(
    config: &GraphConfig,
    state_dir: &Path,
    id: Option<&str>,
    as_json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let store = artifact_store(config, state_dir);
    let id = match id {
        Some(id) => id.to_string(),
        None => match latest_artifact_id(&store)? {
            Some(id) => id,
            None => bail!("no stored graph artifacts in {}", store.dir().display()),
        },
    };
    let loaded = load_global_resource_graph(&store, &id)?;

    if as_json {
        return write_json(out, &loaded.graph);
    }

    let graph = &loaded.graph;
    writeln!(out, "Artifact:  {}", loaded.artifact_id)?;
    writeln!(out, "Version:   {}", graph.version)?;
    writeln!(out, "Built at:  {}", graph.timestamp.to_rfc3339())?;
    write_summary(out, &graph.resolutions.summary)?;
    Ok(())
}

fn cmd_list(
    config: &GraphConfig,
    state_dir: &Path,
    as_json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let store = artifact_store(config, state_dir);
    let summaries = store.list_artifacts()?;
    if as_json {
        return write_json(out, &summaries);
    }
    if summaries.is_empty() {
        writeln!(out, "No artifacts in {}", store.dir().display())?;
    }
    for s in &summaries {
        writeln!(out, "{}  {}  {}", s.timestamp.to_rfc3339(), s.artifact_type, s.id)?;
    }
    Ok(())
}

// ─── Inspect ──────────────────────────────────────────────────────

fn cmd_scan(root: &Path, config: &GraphConfig, as_json: bool, out: &mut dyn Write) -> Result<()> {
    let mut scanner = Scanner::new(&config.excluding_state_dir());
    let results = scanner.scan_repository(root)?;
    if as_json {
        return write_json(out, &results);
    }
    for r in &results {
        writeln!(
            out,
            "{:<50} {:<14} {:<11} {:<9} {:>8}",
            r.path,
            r.resource_type.to_string(),
            r.language.to_string(),
            r.format.to_string(),
            r.size
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", scanner.summary())?;
    Ok(())
}

// ─── Queries ──────────────────────────────────────────────────────

fn cmd_query(
    command: &Commands,
    analysis: &Analysis,
    as_json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let resolver = &analysis.resolver;
    let graph = analysis.graph();

    match command {
        Commands::Stats => {
            let stats = graph.get_statistics();
            let summary = resolver.export_resolutions().summary;
            if as_json {
                return write_json(out, &json!({ "statistics": stats, "summary": summary }));
            }
            writeln!(out, "Nodes:      {}", stats.node_count)?;
            writeln!(out, "Edges:      {}", stats.edge_count)?;
            writeln!(out, "Avg degree: {:.2}", stats.avg_degree)?;
            write_summary(out, &summary)?;
        }

        Commands::Resolve { path } => {
            let node = resolver.resolve_file(path);
            if as_json {
                return write_json(out, &json!({ "found": node.is_some(), "node": node }));
            }
            match node {
                Some(n) => write_node(out, n)?,
                None => writeln!(out, "Not found: {path}")?,
            }
        }

        Commands::Find { pattern } => {
            let res = resolver.resolve_path(pattern)?;
            if as_json {
                return write_json(out, &res);
            }
            if !res.found {
                writeln!(out, "No resources match '{pattern}'")?;
            }
            for p in &res.paths {
                writeln!(out, "{p}")?;
            }
        }

        Commands::Depends { from, to } => {
            let connected = resolver.resolve_dependency(from, to);
            if as_json {
                return write_json(
                    out,
                    &json!({ "from": from, "to": to, "dependency": connected }),
                );
            }
            let verdict = if connected { "depends on" } else { "does not depend on" };
            writeln!(out, "{from} {verdict} {to}")?;
        }

        Commands::Deps { path } => {
            let Some(node) = resolver.resolve_file(path) else {
                bail!("resource not found: {path}");
            };
            let declared: Vec<String> = resolver
                .index_entries()
                .get(path)
                .map(|e| e.dependencies.iter().map(|d| d.path.clone()).collect())
                .unwrap_or_default();
            let dependencies = paths(graph.get_dependencies(&node.id));
            let dependents = paths(graph.get_dependents(&node.id));
            if as_json {
                return write_json(
                    out,
                    &json!({
                        "path": path,
                        "dependencies": dependencies,
                        "dependents": dependents,
                        "declared": declared,
                    }),
                );
            }
            writeln!(out, "{path}")?;
            write_list(out, "Depends on", &dependencies)?;
            write_list(out, "Used by", &dependents)?;
            let unresolved: Vec<String> = declared
                .into_iter()
                .filter(|d| graph.get_node_by_path(d).is_none())
                .collect();
            write_list(out, "Unresolved", &unresolved)?;
        }

        Commands::Missing => {
            let res = resolver.resolve_missing_dependencies();
            write_resolution(
                out,
                &res,
                as_json,
                "All declared dependencies resolve",
                "missing dependencies",
            )?;
        }

        Commands::Orphans => {
            let orphans = paths(resolver.resolve_orphan_nodes());
            if as_json {
                return write_json(out, &orphans);
            }
            write_list(out, "Orphans", &orphans)?;
        }

        Commands::Cycles => {
            let cycles = resolver.resolve_cyclic_dependencies();
            if as_json {
                return write_json(out, &cycles);
            }
            if cycles.is_empty() {
                writeln!(out, "No dependency cycles")?;
            }
            for cycle in &cycles {
                writeln!(out, "{}", cycle_paths(graph, cycle).join(" -> "))?;
            }
        }

        Commands::Compliance => {
            let res = resolver.resolve_governance_compliance();
            write_resolution(
                out,
                &res,
                as_json,
                "Every resource has a semantic anchor",
                "without semantic anchor",
            )?;
        }

        Commands::Build | Commands::Load { .. } | Commands::List | Commands::Scan => {
            bail!("{command:?} is not a query command")
        }
    }
    Ok(())
}

// ─── Output Helpers ───────────────────────────────────────────────

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_node(out: &mut dyn Write, node: &GraphNode) -> Result<()> {
    writeln!(out, "{}", node.path)?;
    writeln!(out, "  id:       {}", node.id)?;
    writeln!(out, "  type:     {}", node.resource_type)?;
    writeln!(out, "  language: {}", node.language)?;
    if let Some(anchor) = &node.semantic_anchor {
        writeln!(out, "  anchor:   {anchor}")?;
    }
    if let Some(layer) = &node.layer {
        writeln!(out, "  layer:    {layer}")?;
    }
    if let Some(version) = &node.charter_version {
        writeln!(out, "  charter:  {version}")?;
    }
    Ok(())
}

fn write_list(out: &mut dyn Write, title: &str, items: &[String]) -> Result<()> {
    writeln!(out, "{title} ({}):", items.len())?;
    for item in items {
        writeln!(out, "  {item}")?;
    }
    Ok(())
}

fn write_resolution(
    out: &mut dyn Write,
    res: &Resolution,
    as_json: bool,
    ok_message: &str,
    label: &str,
) -> Result<()> {
    if as_json {
        return write_json(out, res);
    }
    if res.found {
        writeln!(out, "{ok_message}")?;
        return Ok(());
    }
    writeln!(out, "{} {label}:", res.missing.len())?;
    for item in &res.missing {
        writeln!(out, "  {item}")?;
    }
    Ok(())
}

fn write_summary(out: &mut dyn Write, summary: &ResolutionSummary) -> Result<()> {
    writeln!(out, "Resources:            {}", summary.node_count)?;
    writeln!(out, "Dependencies:         {}", summary.edge_count)?;
    writeln!(out, "Missing dependencies: {}", summary.missing_dependency_count)?;
    writeln!(out, "Orphans:              {}", summary.orphan_count)?;
    writeln!(out, "Cycles:               {}", summary.cycle_count)?;
    writeln!(out, "Without anchor:       {}", summary.non_compliant_count)?;
    Ok(())
}

fn paths(nodes: Vec<&GraphNode>) -> Vec<String> {
    nodes.into_iter().map(|n| n.path.clone()).collect()
}

fn cycle_paths(graph: &ResourceGraph, cycle: &[String]) -> Vec<String> {
    cycle
        .iter()
        .map(|id| {
            graph
                .get_node_by_id(id)
                .map(|n| n.path.clone())
                .unwrap_or_else(|| id.clone())
        })
        .collect()
}
