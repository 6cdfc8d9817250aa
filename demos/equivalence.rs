use clap::Parser;
use color_eyre::eyre::{bail, eyre};

use cdp_rs::equivalence::{Outcome, SearchConfig};
use cdp_rs::generate::from_cayley_polytope;
use cdp_rs::matrix::Matrix;
use cdp_rs::polytope::Polytope;
use cdp_rs::types::{int, Point, Rational};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Vertices of the Cayley polytope, e.g. "-2,0; 0,2; 1,2; 2,1; 2,-2; -2,-2".
    #[arg(value_name = "VERTICES")]
    vertices: String,

    /// Shear weights of the two functions, e.g. "-2,2".
    #[clap(long, value_name = "WEIGHTS", default_value = "1,-1")]
    shear: String,

    /// Shear direction (defaults to all ones).
    #[clap(long, value_name = "VECTOR")]
    direction: Option<String>,

    /// Reflect the base through the origin.
    #[clap(long)]
    reflect: bool,

    /// Maximum number of candidates to examine.
    #[clap(long, value_name = "INT")]
    budget: Option<u64>,
}

fn parse_point(s: &str) -> color_eyre::Result<Point> {
    s.split(',')
        .map(|x| x.trim().parse::<Rational>().map_err(|e| eyre!("bad number {:?}: {}", x, e)))
        .collect()
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let vertices = args.vertices.split(';').map(parse_point).collect::<Result<Vec<_>, _>>()?;
    let poly = Polytope::new(vertices)?;
    let cdp = from_cayley_polytope(&poly)?;
    println!("{}", cdp);

    let n = cdp.dim();
    let betas = parse_point(&args.shear)?;
    let direction = match &args.direction {
        Some(s) => parse_point(s)?,
        None => vec![int(1); n],
    };
    if direction.len() != n {
        bail!("direction has {} components, base dimension is {}", direction.len(), n);
    }

    let mut other = cdp.clone().sheared(&betas, &direction)?;
    if args.reflect {
        other = other.transformed(&Matrix::diagonal(vec![-1; n]))?;
    }
    println!("{}", other);

    let config = SearchConfig {
        max_candidates: args.budget,
    };
    let time_search = std::time::Instant::now();
    let (outcome, stats) = cdp.find_equivalence(&other, &config);
    println!("stats = {:?}", stats);
    match outcome {
        Outcome::Equivalent(witness) => {
            println!("Equivalent");
            println!("  permutation = {:?}", witness.permutation);
            println!("  transform = {}", witness.transform);
            println!("  mapping = {:?}", witness.mapping);
        }
        Outcome::NotEquivalent => println!("Not equivalent"),
        Outcome::BudgetExhausted => println!("Search budget exhausted"),
    }
    println!("Search done in {:.3} s", time_search.elapsed().as_secs_f64());

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
