use clap::Parser;

use localchat_cli::prompt::preview;
use localchat_cli::{init_tracing, CommonArgs};
use localchat_text::{IndexOptions, SimilarityIndex};

#[derive(Debug, Parser)]
#[command(name = "localchat-search", about = "Rank local paragraphs against a query")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    /// Number of hits to print (defaults to rag.top_k)
    #[arg(short = 'k', long)]
    limit: Option<usize>,
    /// Query text
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    init_tracing("info");
    let cli = Cli::parse();
    let settings = cli.common.load_settings()?;
    let query = cli.query.join(" ");
    let limit = cli.limit.unwrap_or(settings.rag.top_k);

    let index = SimilarityIndex::open(&IndexOptions::from_settings(&settings));
    let hits = index.top_k(&query, limit);
    println!("Query: {}  ({} paragraphs indexed)", query, index.len());
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("\n[{}] {}  score={:.4}", i + 1, hit.id, hit.score);
        println!("    {}", preview(&hit.text, settings.rag.preview_chars).replace('\n', " "));
    }
    Ok(())
}
