use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::path::PathBuf;

/// Write a random acyclic edge list over nodes P0..P{n-1}
#[derive(Parser, Debug)]
#[command(name = "generate")]
struct Args {
    /// Number of nodes
    #[arg(long, default_value_t = 50)]
    nodes: usize,

    /// Number of edges
    #[arg(long, default_value_t = 50)]
    edges: usize,

    #[arg(long, default_value_t = 1234)]
    seed: u64,

    /// Output file [default: stdout]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    anyhow::ensure!(
        args.edges == 0 || args.nodes >= 2,
        "need at least two nodes to draw an edge"
    );

    let mut rng = StdRng::seed_from_u64(args.seed);

    // hidden topological order, every arc goes forward in it
    let mut order: Vec<usize> = (0..args.nodes).collect();
    order.shuffle(&mut rng);

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(sink);

    for _ in 0..args.edges {
        let mut a = rng.gen_range(0..args.nodes);
        let mut b = rng.gen_range(0..args.nodes);
        while a == b {
            b = rng.gen_range(0..args.nodes);
        }
        if order[a] > order[b] {
            std::mem::swap(&mut a, &mut b);
        }
        writer.write_record([format!("P{}", a), format!("P{}", b)])?;
    }
    writer.flush()?;

    Ok(())
}
