use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use edgeviz::{
    read_edge_list, refined_layered_layout, spring_layout, sum_edge_length, validate, write_dot,
    write_positions, write_svg, AnnealConfig, LabelGraph, SpringConfig, SvgStyle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutKind {
    /// Force-directed placement
    Spring,
    /// Left-to-right columns, DAG input only
    Layered,
}

/// Draw a directed graph from a `source,target` edge list
#[derive(Parser, Debug)]
#[command(name = "edgeviz", version)]
#[command(about = "Draw a directed graph from a CSV edge list", long_about = None)]
struct Args {
    /// Edge list, one `source,target` pair per line
    input: PathBuf,

    /// Layout algorithm
    #[arg(long, value_enum, default_value_t = LayoutKind::Spring)]
    layout: LayoutKind,

    /// Spring layout iterations
    #[arg(long, default_value_t = 50)]
    iterations: usize,

    /// Seed for the spring layout start positions and the row swaps
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Row swaps tried to shorten arcs in the layered layout (0 keeps the greedy rows)
    #[arg(long, default_value_t = 20_000)]
    anneal_steps: usize,

    /// SVG output path [default: input path with .svg extension]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a graphviz file
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Also write node positions as `name,x,y` rows
    #[arg(long)]
    positions: Option<PathBuf>,

    /// Print the parsed edge list and exit
    #[arg(long)]
    parse_only: bool,

    /// Print the edge list as JSON (with --parse-only)
    #[arg(long, requires = "parse_only")]
    json: bool,

    /// Validate the input strictly (.csv, one comma per line, acyclic) and exit
    #[arg(long, conflicts_with = "parse_only")]
    check: bool,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "EDGEVIZ_LOG", default_value = "info")]
    log_level: Level,
}

// Outputs go next to the input by default; never let one replace it.
fn ensure_not_input(output: &Path, input: &Path) -> anyhow::Result<()> {
    let same = output == input
        || (output.exists() && std::fs::canonicalize(output)? == std::fs::canonicalize(input)?);
    if same {
        bail!(
            "refusing to overwrite the input file {} with output",
            input.display()
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.check {
        let edges = validate::validate_input(&args.input)?;
        info!("{} edges, input is valid", edges.len());
        println!("OK");
        return Ok(());
    }

    let edges = read_edge_list(&args.input)?;
    info!("Read {} edges from {}", edges.len(), args.input.display());

    if args.parse_only {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&edges)?);
        } else {
            print!("{}", edges);
        }
        return Ok(());
    }

    let graph = LabelGraph::from_edges(&edges);
    info!("Number of nodes in graph: {}", graph.node_count());
    info!("Number of edges in graph: {}", graph.edge_count());
    if graph.node_count() == 0 {
        warn!("Input has no edges, drawing an empty graph");
    }

    let layout = match args.layout {
        LayoutKind::Spring => spring_layout(
            &graph,
            &SpringConfig {
                iterations: args.iterations,
                seed: args.seed,
                ..SpringConfig::default()
            },
        ),
        LayoutKind::Layered => refined_layered_layout(
            &graph,
            &AnnealConfig {
                steps: args.anneal_steps,
                seed: args.seed,
                ..AnnealConfig::default()
            },
        )?,
    };
    info!("Total edge length: {:.4}", sum_edge_length(&graph, &layout));

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("svg"));
    for path in std::iter::once(&output).chain(&args.dot).chain(&args.positions) {
        ensure_not_input(path, &args.input)?;
    }
    write_svg(&output, &graph, &layout, &SvgStyle::default())?;

    if let Some(path) = &args.dot {
        write_dot(path, &graph, &layout)?;
    }
    if let Some(path) = &args.positions {
        write_positions(path, &graph, &layout)?;
    }

    Ok(())
}
