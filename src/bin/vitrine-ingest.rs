//! Catalog ingest tool.
//!
//! Reads a JSON-Lines catalog dump, embeds product descriptions in batches,
//! recreates the search index with the k-NN mapping, and indexes every
//! document keyed by image URL. Invalid lines are logged and skipped.
//!
//! Usage: `vitrine-ingest [catalog.jsonl]`, with the pipeline config path
//! taken from `VITRINE_PIPELINE_CONFIG` (default `vitrine.yaml`).

use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use vitrine::{
    load_products, CatalogConfig, Embedder, IndexedProduct, PipelineConfig, SearchClient,
};

const EMBED_BATCH_SIZE: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path =
        std::env::var("VITRINE_PIPELINE_CONFIG").unwrap_or_else(|_| "vitrine.yaml".into());
    let catalog_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VITRINE_CATALOG_PATH").ok())
        .unwrap_or_else(|| "catalog.jsonl".into());

    let cfg = PipelineConfig::load(&config_path)
        .with_context(|| format!("loading pipeline config from {config_path}"))?;
    let embedder = Embedder::new(cfg.embedding.clone())?;
    let search = SearchClient::new(cfg.search.clone())?;

    let file =
        File::open(&catalog_path).with_context(|| format!("opening catalog {catalog_path}"))?;
    let report = load_products(BufReader::new(file), &CatalogConfig::default())?;
    for (line, err) in &report.skipped {
        tracing::warn!(line, error = %err, "skipping invalid catalog record");
    }
    tracing::info!(
        records = report.records.len(),
        skipped = report.skipped.len(),
        "catalog dump loaded"
    );

    // Rebuild from scratch so products removed from the dump also disappear
    // from search.
    search.delete_index().await?;
    search.ensure_index().await?;

    let mut indexed = 0usize;
    for chunk in report.records.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|r| r.description.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        for (record, embedding) in chunk.iter().zip(embeddings) {
            let doc = IndexedProduct {
                name: record.name.clone(),
                description: record.description.clone(),
                price: record.price.clone(),
                image_url: record.image_url.clone(),
                embedding: embedding.vector,
            };
            search.index_product(&record.image_url, &doc).await?;
            indexed += 1;
        }
        tracing::info!(indexed, total = report.records.len(), "indexing progress");
    }

    tracing::info!(
        indexed,
        skipped = report.skipped.len(),
        index = %cfg.search.index,
        "ingest complete"
    );
    Ok(())
}
