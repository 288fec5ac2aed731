use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use localchat_cli::{init_tracing, CommonArgs};
use localchat_text::{IndexOptions, SimilarityIndex};

#[derive(Debug, Parser)]
#[command(name = "localchat-indexer", about = "Rebuild the persisted TF-IDF index from the document folder")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing("info");
    let cli = Cli::parse();
    let settings = cli.common.load_settings()?;
    let options = IndexOptions::from_settings(&settings);

    println!("TF-IDF Indexer\n==============");
    println!("Documents: {}", options.docs_dir.display());
    println!("Index:     {}", options.index_dir.display());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("scanning and fitting...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let index = SimilarityIndex::rebuild(&options);
    spinner.finish_and_clear();
    let index = index?;

    println!("Indexed {} paragraphs, {} terms", index.len(), index.vocabulary_len());
    if index.is_empty() {
        println!("No .{} files found; queries will return nothing.", options.extensions.join(" / ."));
    }
    Ok(())
}
