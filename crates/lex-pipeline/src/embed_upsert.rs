//! Shared embed-then-upsert helper used by every per-kind Stage-1 pipeline:
//! compute the hybrid (dense, sparse) pair for a record's text and upsert it
//! under its deterministic point id.

use lex_core::identity::point_id;
use serde::Serialize;

use crate::context::PipelineContext;
use crate::error::PipelineError;

pub async fn embed_and_upsert<T: Serialize>(
    ctx: &PipelineContext,
    collection: &str,
    id: &str,
    text: &str,
    record: &T,
) -> Result<(), PipelineError> {
    let dense = ctx.dense.embed(text).await;
    let sparse = ctx.sparse.embed(text);
    lex_store::upsert_record(&ctx.store, collection, point_id(id), dense, &sparse, record).await?;
    Ok(())
}
