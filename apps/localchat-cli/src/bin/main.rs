use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use localchat_cli::memory::ChatHistory;
use localchat_cli::session::{ChatSession, Reply};
use localchat_cli::{init_tracing, CommonArgs};
use localchat_llm::build_provider;
use localchat_text::{IndexOptions, LazyIndex};

#[derive(Debug, Parser)]
#[command(name = "localchat", about = "Chat with an LLM, optionally grounded in local documents")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    /// Start with retrieval over the local documents enabled
    #[arg(long)]
    rag: bool,
    /// Chat history file (overrides chat.memory_path)
    #[arg(long)]
    memory: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing("warn");
    let cli = Cli::parse();
    let settings = cli.common.load_settings()?;

    let provider = build_provider(&settings.llm);
    let retriever = LazyIndex::new(IndexOptions::from_settings(&settings));
    let history = ChatHistory::load(cli.memory.clone().unwrap_or_else(|| settings.chat.memory_path.clone()));
    let mut session = ChatSession::new(provider, retriever, history, &settings);
    session.set_rag(cli.rag);

    println!("=== localchat ({}) ===", session.provider_name());
    println!("Commands: ':reset', ':rag on', ':rag off', 'calc: 2+2'");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            println!("\nGoodbye!");
            break;
        }
        match session.handle(&line) {
            Reply::Nothing => {}
            Reply::Notice(text) => println!("{}", text),
            Reply::Tool(text) => println!("AI (tool): {}", text),
            Reply::Assistant(text) => println!("AI: {}", text),
            Reply::Failed(reason) => println!("AI: [error] {}", reason),
        }
    }
    Ok(())
}
