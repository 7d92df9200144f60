use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tlib_core::{Engine, EngineConfig, Tensor};

const BANNER: &str = r#"
 _   _ _ _
| |_| (_) |__
| __| | | '_ \
| |_| | | |_) |
 \__|_|_|_.__/"#;

#[derive(Parser)]
#[command(
    name = "tlib",
    about = "tlib tensor engine CLI",
    long_about = "A minimal dense f32 tensor engine.\n\nCreate tensors, fill them, add and multiply them element-wise,\nand print the results.",
    version
)]
struct Cli {
    /// JSON engine config (print_precision, seed, max_print_elements)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show version and effective configuration
    Info,
    /// Run the add/multiply walkthrough on two 2x2 tensors
    Demo,
    /// Create a tensor of uniform [0, 1) samples and print it
    Random {
        /// Shape, comma-separated
        #[arg(long, default_value = "2,3")]
        shape: String,
        /// Seed the generator for a reproducible tensor
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Time add, multiply and sum over flat tensors
    Bench {
        /// Element counts to benchmark (comma-separated)
        #[arg(long, default_value = "1024,65536,1048576")]
        sizes: String,
        /// Iterations per measurement
        #[arg(long, default_value = "20")]
        iters: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    tracing::debug!(?config, "engine config");

    match cli.command {
        Commands::Info => cmd_info(&config),
        Commands::Demo => cmd_demo(config),
        Commands::Random { shape, seed } => cmd_random(config, &shape, seed),
        Commands::Bench { sizes, iters } => cmd_bench(&sizes, iters),
    }
}

fn parse_list(s: &str) -> anyhow::Result<Vec<usize>> {
    s.split(',')
        .map(|d| d.trim().parse::<usize>().with_context(|| format!("bad number '{}'", d)))
        .collect()
}

fn cmd_info(config: &EngineConfig) -> anyhow::Result<()> {
    println!("{}", BANNER);
    println!("  v{}  —  dense f32 tensor engine\n", env!("CARGO_PKG_VERSION"));

    println!("Platform");
    println!("  OS:   {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);

    println!("\nOperations");
    println!("  create, destroy, fill, randomize, set_data");
    println!("  add, multiply (element-wise), exp, log, sum, print");

    println!("\nConfig");
    println!("{}", config.to_json_string());
    Ok(())
}

fn cmd_demo(config: EngineConfig) -> anyhow::Result<()> {
    let mut engine = Engine::new(config);

    let a = engine.create(&[2, 2])?;
    engine.set_data(a, &[1.0, 2.0, 3.0, 4.0])?;
    let b = engine.create(&[2, 2])?;
    engine.set_data(b, &[5.0, 6.0, 7.0, 8.0])?;

    println!("Tensor a:");
    engine.print(a)?;
    println!("Tensor b:");
    engine.print(b)?;

    let sum = engine.add(a, b)?;
    println!("a + b:");
    engine.print(sum)?;

    let prod = engine.multiply(a, b)?;
    println!("a * b (element-wise):");
    engine.print(prod)?;

    println!("sum(a * b) = {}", engine.sum(prod)?);

    for h in [a, b, sum, prod] {
        engine.destroy(h)?;
    }
    Ok(())
}

fn cmd_random(mut config: EngineConfig, shape: &str, seed: Option<u64>) -> anyhow::Result<()> {
    let dims = parse_list(shape).context("invalid --shape")?;
    if seed.is_some() {
        config.seed = seed;
    }
    let mut engine = Engine::new(config);

    let t = engine.create(&dims)?;
    engine.randomize(t)?;
    engine.print(t)?;
    println!("sum = {}", engine.sum(t)?);
    engine.destroy(t)?;
    Ok(())
}

fn cmd_bench(sizes_str: &str, iters: usize) -> anyhow::Result<()> {
    let sizes = parse_list(sizes_str).context("invalid --sizes")?;
    let iters = iters.max(1);

    println!("=== tlib element-wise benchmark ({} iters) ===\n", iters);
    println!(
        "{:<12} {:>12} {:>14} {:>12}",
        "Elements", "add (ms)", "multiply (ms)", "sum (ms)"
    );
    println!("{}", "-".repeat(54));

    for n in sizes {
        let a = Tensor::rand(&[n])?;
        let b = Tensor::rand(&[n])?;

        let add_s = time_it(iters, || {
            let _ = std::hint::black_box(a.add(&b));
        });
        let mul_s = time_it(iters, || {
            let _ = std::hint::black_box(a.multiply(&b));
        });
        let sum_s = time_it(iters, || {
            let _ = std::hint::black_box(a.sum());
        });

        println!(
            "{:<12} {:>12.4} {:>14.4} {:>12.4}",
            n,
            add_s * 1000.0,
            mul_s * 1000.0,
            sum_s * 1000.0,
        );
    }
    Ok(())
}

fn time_it(iters: usize, mut f: impl FnMut()) -> f64 {
    let start = Instant::now();
    for _ in 0..iters {
        f();
    }
    start.elapsed().as_secs_f64() / iters as f64
}
