use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

use cardscan::{
    Annotator, Catalog, FeatureExtractor, FramePipeline, ImageSequenceSink, ImageSequenceSource,
    Partition, RecognitionConfig, WorkDistributor,
};

#[derive(Parser)]
#[command(name = "cardscan")]
#[command(about = "Recognize playing cards in a frame sequence and write annotated frames")]
struct Cli {
    /// JSON manifest listing reference images and their labels
    #[arg(long, value_name = "MANIFEST")]
    catalog: PathBuf,

    /// Directory of input frames, read in file name order
    #[arg(long, value_name = "DIR")]
    input: PathBuf,

    /// Directory receiving the annotated frames
    #[arg(long, value_name = "DIR")]
    output: PathBuf,

    /// Number of worker threads
    #[arg(long, env = "CARDSCAN_WORKERS")]
    workers: Option<usize>,

    /// JSON file overriding recognition parameters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Font used to render card labels
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Save rectified crops to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => RecognitionConfig::from_file(path)?,
        None => RecognitionConfig::default(),
    };

    let workers = args.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let partition = Partition::new(workers)?;

    let extractor = FeatureExtractor::new(&config);
    let catalog = Catalog::load(&args.catalog, &extractor)?;

    // Both streams are opened before any frame is processed
    let mut source = ImageSequenceSource::open(&args.input)?;
    let mut sink = ImageSequenceSink::create(&args.output)?;

    let mut annotator = Annotator::new();
    if let Some(font) = &args.font {
        annotator = annotator.with_font_file(font)?;
    }

    let mut pipeline = FramePipeline::new(&config, &catalog)
        .with_extractor(extractor)
        .with_annotator(annotator);
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let summary = WorkDistributor::new(&pipeline, partition, &config).run(&mut source, &mut sink)?;

    println!("\n=== Card Recognition Results ===");
    println!("Catalog entries: {}", catalog.len());
    println!("Frames read: {}", summary.frames_read);
    println!("Frames written: {}", summary.frames_written);
    println!("Cards annotated: {}", summary.overlays);
    if args.verbose {
        for report in &summary.workers {
            println!(
                "  Worker {}: {} frames, {} candidates, {} dropped crops, {} cards",
                report.worker, report.frames, report.candidates, report.dropped, report.overlays
            );
        }
    }

    Ok(())
}
