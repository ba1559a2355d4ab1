use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::dense::DenseEmbedder;

/// Generates dense embeddings for a batch of texts with bounded concurrency,
/// preserving input order in the returned vector.
pub async fn embed_dense_batch(
    embedder: Arc<DenseEmbedder>,
    texts: Vec<String>,
    concurrency: usize,
) -> Vec<Vec<f32>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(texts.len());

    for text in texts {
        let embedder = Arc::clone(&embedder);
        let semaphore = Arc::clone(&semaphore);
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
            embedder.embed(&text).await
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await.expect("embedding task panicked"));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::DenseEmbedderConfig;

    #[tokio::test]
    async fn preserves_order_of_input_texts() {
        let embedder = Arc::new(DenseEmbedder::new(
            reqwest::Client::new(),
            DenseEmbedderConfig::new("https://example.test/embed", "key", "model"),
        ));

        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = embed_dense_batch(embedder, texts.clone(), 2).await;

        assert_eq!(results.len(), texts.len());
    }
}
