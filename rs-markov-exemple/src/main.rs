use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use log::info;

use rs_markov_core::MarkovChain;
use rs_markov_core::io::{build_output_path, read_text};
use rs_markov_core::model::config::ChainConfig;
use rs_markov_core::model::observer::ShrinkToFit;

/// Train a Markov chain on a text file, save it, reload it and generate text.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Text corpus to learn from
    corpus: PathBuf,

    /// Where to save the model (.json, .json.gz or .bin); defaults to the corpus path with `.json.gz`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Longest context length
    #[arg(long, default_value_t = 8)]
    order: usize,

    /// Shortest context length
    #[arg(long, default_value_t = 1)]
    min_order: usize,

    /// Length of every continuation
    #[arg(long, default_value_t = 1)]
    next_order: usize,

    /// Context length decrement between two passes
    #[arg(long, default_value_t = 1)]
    step_down: usize,

    /// Statistics seen this many times or less are pruned
    #[arg(long, default_value_t = 1)]
    threshold: u64,

    /// Text to extend
    #[arg(short, long, default_value = "The ")]
    prompt: String,

    /// Number of samples to print
    #[arg(short = 'n', long, default_value_t = 5)]
    samples: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // The configuration is validated when the model is created
    // (ex. min_order > order is refused here, not in the middle of training)
    let config = ChainConfig::default()
        .with_order(args.order)
        .with_min_order(args.min_order)
        .with_next_order(args.next_order)
        .with_step_down(args.step_down);
    let mut chain = MarkovChain::new(config)?;

    // Train from 'order' down to 'min_order', pruning rare statistics after
    // each pass and whenever the store holds too many contexts
    let corpus = read_text(&args.corpus)?;
    let report = chain
        .trainer(args.threshold)
        .with_reclaim(&ShrinkToFit)
        .train(&corpus);
    info!("{} passes, {} pairs, {} contexts kept", report.passes, report.pairs, chain.len());

    // Save next to the corpus by default ('data/book.txt' -> 'data/book.json.gz')
    let output = match args.output {
        Some(output) => output,
        None => build_output_path(&args.corpus, "json.gz")?,
    };
    chain.save(&output)?;

    // Reload it: sampling behaves exactly the same after a round trip
    let chain = MarkovChain::load(&output)?;

    // One continuation at a time
    match chain.predict_next(&args.prompt) {
        Some(continuation) => println!("Next after {:?}: {:?}", args.prompt, continuation),
        None => println!("Nothing follows {:?}", args.prompt),
    }

    // A fixed number of continuations
    println!("20 continuations: {}{}", args.prompt, chain.predict(&args.prompt, 20));

    // Until a stop character ('.', '!', '?' or a double space) or 500 characters
    for i in 0..args.samples {
        println!("Sample {}: {}{}", i + 1, args.prompt, chain.predict_until(&args.prompt));
    }

    // Custom stop strings and length
    println!("Until a comma: {}{}", args.prompt, chain.predict_until_with(&args.prompt, &[","], 120));

    Ok(())
}
