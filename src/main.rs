use clap::{Parser, ValueEnum};
use cubique::error::Result;
use cubique::policies::{Balanced, Naive, RandomPolicy, SolveConfig};
use cubique::problem::Problem;
use cubique::search::{best_strategy, SearchConfig};
use cubique::simulation::estimate_cost;
use cubique::strategy::StrategyGraph;
use cubique::utils::{Size, SIMULATION_RUNS};
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(author, version, about = "Expected throws to turn a die into another", long_about = None)]
struct Args {
    /// Faces of the die we throw
    #[arg(long, default_value_t = 12)]
    start: Size,
    /// Faces of the die we want
    #[arg(long, default_value_t = 21)]
    target: Size,
    #[arg(long, value_enum, default_value_t = PolicyKind::Balanced)]
    policy: PolicyKind,
    /// Seeds both the random policy and the playouts
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Playouts for the sampled estimate (0 to skip)
    #[arg(long, default_value_t = SIMULATION_RUNS)]
    runs: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyKind {
    Balanced,
    Naive,
    Random,
    Best,
}

fn build(problem: Problem, args: &Args) -> Result<StrategyGraph> {
    let config = SolveConfig::default();
    let mut graph = StrategyGraph::new(problem);
    match args.policy {
        PolicyKind::Balanced => { graph.solve_with(&mut Balanced, &config)?; }
        PolicyKind::Naive => { graph.solve_with(&mut Naive, &config)?; }
        PolicyKind::Random => { graph.solve_with(&mut RandomPolicy::seeded(args.seed), &config)?; }
        PolicyKind::Best => return best_strategy(problem, &SearchConfig::default()),
    }
    graph.update_costs()?;
    Ok(graph)
}

fn run(args: &Args) -> Result<()> {
    let problem = Problem::new(args.start, args.target)?;
    let graph = build(problem, args)?;
    println!("{}", graph);

    if let Some(cost) = graph.expected_cost() {
        println!("Expected throws: {} ({:.4})", cost, cost.to_f64());
    }
    if args.runs > 0 {
        let mut rng = StdRng::seed_from_u64(args.seed);
        let estimate = estimate_cost(&graph, args.runs, &mut rng)?;
        println!("Average over {} playouts: {:.4}", args.runs, estimate);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
