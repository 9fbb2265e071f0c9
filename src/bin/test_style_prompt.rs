use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stylegen::config::{
    StyleRequestConfig, DEFAULT_MAX_CHARS_PER_POST, DEFAULT_MAX_POSTS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
use stylegen::corpus::select;
use stylegen::environment::DEFAULT_LLM_TIMEOUT_SECS;
use stylegen::llm::{OpenAIBackend, PromptAssembler};
use stylegen::metrics::summarize;
use stylegen::prompt::style_messages;

/// Render the style request for a publication already on disk, and
/// optionally send it to the model.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Publication host, e.g. example.substack.com
    host: String,

    /// Directory holding one subdirectory per publication host
    #[arg(short = 'c', long, default_value = "blogs")]
    corpus_root: PathBuf,

    /// Number of recent posts to sample
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_POSTS)]
    max_posts: usize,

    /// Character budget per sample
    #[arg(short = 'x', long, default_value_t = DEFAULT_MAX_CHARS_PER_POST)]
    max_chars: usize,

    /// Model to use
    #[arg(short = 'm', long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Temperature for generation
    #[arg(short = 'T', long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Send the request to the model (requires OPENAI_API_KEY)
    #[arg(short = 'g', long)]
    generate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = StyleRequestConfig {
        max_posts: args.max_posts,
        max_chars_per_post: args.max_chars,
        model: args.model.clone(),
        temperature: args.temperature,
    };
    config.validate()?;

    let samples = select(&args.corpus_root, &args.host, config.max_posts, config.max_chars_per_post);
    if samples.is_empty() {
        println!(
            "No posts found under {}",
            args.corpus_root.join(&args.host).display()
        );
        return Ok(());
    }

    println!("\nSelected {} samples:", samples.len());
    println!("-------------------------------------");
    for sample in &samples {
        println!(
            "{} ({} chars) <- {}",
            sample.title,
            sample.text.chars().count(),
            sample.relative_origin(&args.corpus_root)
        );
    }

    let metrics = summarize(&samples);
    println!("\nMetrics:");
    println!("-------------------------------------");
    for (key, value) in metrics.entries() {
        println!("{}: {}", key, value);
    }

    let messages = style_messages(&args.host, &samples, &metrics);
    println!("\nSystem message:");
    println!("-------------------------------------");
    println!("{}", messages.system);
    println!("\nUser message (abbreviated):");
    println!("-------------------------------------");
    let shortened = messages.user.lines().take(20).collect::<Vec<&str>>().join("\n");
    println!("{}...\n[Prompt continues]", shortened);

    if !args.generate {
        println!("\nPass --generate to send this request to {}.", args.model);
        return Ok(());
    }

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| anyhow!("OPENAI_API_KEY environment variable is not set."))?;
    let api_base = std::env::var("OPENAI_API_BASE").ok();
    let backend = OpenAIBackend::new(
        &api_key,
        api_base.as_deref(),
        Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
    );
    let assembler = PromptAssembler::new(Arc::new(backend));

    println!("\nGenerating style prompt with model: {}...", args.model);
    let start_time = std::time::Instant::now();
    let result = assembler
        .assemble(&args.host, &samples, &metrics, &config.llm_params())
        .await;
    let elapsed = start_time.elapsed();

    match result {
        Ok(style_prompt) => {
            println!("\nStyle prompt (generated in {:.2?}):", elapsed);
            println!("-------------------------------------");
            println!("{}", style_prompt);
            println!("-------------------------------------");
        }
        Err(e) => println!("\nError: failed to generate style prompt: {}", e),
    }

    Ok(())
}
