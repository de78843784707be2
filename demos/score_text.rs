//! Command-line factuality scorer.
//!
//! ```text
//! score_text --ingest <topic> <file>   chunk a document into the passage store
//! score_text <topic> [text...]         score text (reads stdin when omitted)
//! ```
//!
//! Settings come from `ATOMFACT_*` variables; provider credentials from the
//! variables the `genai` client reads (e.g. `OPENAI_API_KEY`).

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, bail};

use atomfact::constants::DEFAULT_PASSAGE_TOKENS;
use atomfact::scoring::DEFAULT_CORPUS_NAME;
use atomfact::{Config, DiskPassageStore, FactScorer, GenaiModel, PassageStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let store = Arc::new(DiskPassageStore::new(
        DEFAULT_CORPUS_NAME,
        config.passage_dir.clone(),
    ));

    if args.first().map(String::as_str) == Some("--ingest") {
        let [_, topic, path] = args.as_slice() else {
            bail!("usage: score_text --ingest <topic> <file>");
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?;
        let count = store.put_document(topic, &text, DEFAULT_PASSAGE_TOKENS)?;
        tracing::info!(topic = %topic, passages = count, "Ingested document");
        return Ok(());
    }

    let Some((topic, words)) = args.split_first() else {
        bail!("usage: score_text <topic> [text...]");
    };
    let text = if words.is_empty() {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        words.join(" ")
    };

    if !store.contains_topic(topic)? {
        tracing::warn!(topic = %topic, "Topic not in passage store; claims will score as unsupported");
    }

    let scorer = FactScorer::builder()
        .config(config)
        .with_model(Arc::new(GenaiModel::default()))
        .with_corpus(store)
        .build()?;

    let score = scorer.score(&text, topic).await;
    println!("{}", serde_json::to_string_pretty(&score)?);

    let flushed = scorer.shutdown().await;
    tracing::info!(flushed, "Cache flushed");
    Ok(())
}
