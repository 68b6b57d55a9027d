use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "compgraph", version)]
struct Cli {
    /// Log pass summaries to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize one or more scene variants and print the code-generation plan.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input scene JSON. Repeat for multi-variant plans; variants are named by file stem.
    #[arg(long = "in", required = true)]
    in_paths: Vec<PathBuf>,

    /// Options JSON (`{"optimizer": {...}, "planner": {...}}`).
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Ignore descriptive labels when merging duplicates.
    #[arg(long)]
    ignore_descriptions: bool,

    /// Print the plan report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_scene(path: &Path) -> anyhow::Result<(compgraph::Scene, compgraph::ObjectRef)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read scene '{}'", path.display()))?;
    compgraph::Scene::from_json(&text).with_context(|| format!("load scene '{}'", path.display()))
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<compgraph::SessionOpts> {
    let Some(path) = path else {
        return Ok(compgraph::SessionOpts::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read options '{}'", path.display()))?;
    compgraph::SessionOpts::from_json(&text)
        .with_context(|| format!("parse options '{}'", path.display()))
}

fn variant_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let mut opts = read_opts(args.opts.as_deref())?;
    if args.ignore_descriptions {
        opts.optimizer.canonicalize.ignore_descriptive_fields = true;
    }

    let optimizer = compgraph::Optimizer::new(opts.optimizer.clone());
    let mut variants = Vec::with_capacity(args.in_paths.len());
    for path in &args.in_paths {
        let (scene, root) = read_scene(path)?;
        let optimized = optimizer
            .optimize(&scene, root)
            .with_context(|| format!("optimize '{}'", path.display()))?;
        variants.push((variant_name(path), optimized));
    }

    let plan = compgraph::Optimizer::plan_variants(&variants, &opts.planner)
        .with_context(|| "plan code generation")?;

    let mut trace = compgraph::TraceEmitter::new();
    compgraph::generate(&plan, &mut trace).with_context(|| "drive recording emitter")?;
    let replay = trace
        .finish()
        .replay()
        .with_context(|| "replay planned construction order")?;

    let report = plan.report();
    if args.json {
        let out = serde_json::json!({
            "stats": variants
                .iter()
                .map(|(name, o)| (name.clone(), serde_json::to_value(&o.stats).unwrap_or_default()))
                .collect::<serde_json::Map<_, _>>(),
            "plan": report,
            "replay": replay,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).with_context(|| "serialize report")?
        );
        return Ok(());
    }

    for ((name, optimized), v) in variants.iter().zip(&report.variants) {
        let s = &optimized.stats;
        println!(
            "{name}: {} nodes, {} merged, {} copied, {} elided, {} absorbed",
            s.nodes, s.merged, s.copied, s.elided, s.absorbed
        );
        println!(
            "  root {}, {} factories, {} stored, {} inlined, {} helpers",
            v.root_factory.as_deref().unwrap_or("-"),
            v.factories,
            v.stored,
            v.inlined,
            v.helpers
        );
        for n in &v.nodes {
            let Some(factory) = &n.name else {
                continue;
            };
            let mut flags = Vec::new();
            if n.requires_storage {
                flags.push("stored");
            }
            if n.shared {
                flags.push("shared");
            }
            println!(
                "    {factory:<32} {:<26} refs={} {}",
                n.kind.name(),
                n.refs,
                flags.join(",")
            );
        }
    }
    for shared in &report.shared {
        println!(
            "shared {} ({}) used by {} node(s)",
            shared.name,
            shared.kind.name(),
            shared.users.len()
        );
    }
    println!(
        "replay ok: {} constructed, {} storage reads",
        replay.constructed, replay.reads
    );
    Ok(())
}
