use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tokensim::{
    config::{default_config_file, read_config_file, Config, ConfigOpt},
    detector::Detector,
    language::LanguageRegistry,
    result::ComparisonResult,
    validate::{report_errors, validate},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Finds similar submissions by tiling their token sequences")]
struct Args {
    /// Directory with one entry per submission.
    root: PathBuf,

    /// More log output. Repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Number of comparisons to print.
    #[arg(long, value_name = "NUM", default_value_t = 20)]
    show: usize,

    /// Check the tiles of every printed comparison.
    #[arg(long)]
    check: bool,

    /// Configuration file to use instead of the default one.
    #[arg(long, value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigOpt,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_result(result: &ComparisonResult, show: usize) {
    println!("{result}");
    println!("Similarity distribution ({:?}):", result.metric());
    for (bucket, count) in result.similarity_distribution().iter().enumerate().rev() {
        println!("  {:>3}% - {:>3}%: {count}", bucket * 10, bucket * 10 + 10);
    }
    println!("Most similar:");
    for comparison in result.top_comparisons(show) {
        let [first, second] = comparison.names();
        println!(
            "  {:6.2}%  {first} <-> {second}  ({} tokens in {} tiles)",
            comparison.similarity(result.metric()) * 100.0,
            comparison.matched_tokens(),
            comparison.matches().len()
        );
    }
    if !result.skipped_comparisons().is_empty() {
        println!("Skipped:");
        for skipped in result.skipped_comparisons() {
            println!("  {} <-> {}: {}", skipped.names[0], skipped.names[1], skipped.reason);
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file_config = match &args.config_file {
        Some(path) => Some(read_config_file(path)?),
        None => default_config_file().map(|path| read_config_file(&path)).transpose()?,
    };
    let mut config = Config::default();
    if let Some(file_config) = file_config {
        config = config.update(file_config);
    }
    let config = config.update(args.config);

    let registry = LanguageRegistry::with_builtin_languages();
    let detector = Detector::new(config, &registry)?;
    let mut set = detector.read(&args.root)?;
    let result = detector.compare(&mut set)?;

    if args.check {
        for comparison in result.top_comparisons(args.show) {
            let [first, second] = comparison.submissions().map(|id| set[id].tokens());
            // Paged out by the external strategy.
            let (Some(first), Some(second)) = (first, second) else {
                continue;
            };
            report_errors(&validate(comparison, [first, second], detector.minimum_match_length()));
        }
    }

    print_result(&result, args.show);
    Ok(())
}

fn main() {
    // If main() itself returns Result, Rust prints the error with Debug, not Display.
    if let Err(e) = try_main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
