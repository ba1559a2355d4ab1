use std::collections::HashMap;

use lex_embed::SparseVector;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Condition, Filter, Fusion, PointId, PrefetchQueryBuilder, Query, QueryPointsBuilder, Range,
    ScrollPointsBuilder, Value as QdrantValue, Vector,
};

use crate::client::VectorStore;
use crate::error::StoreError;

/// Must-clauses a search request can narrow by.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub court: Vec<String>,
    pub division: Vec<String>,
    pub legislation_type: Vec<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub legislation_id: Option<String>,
    pub reference_field: Option<&'static str>,
    pub reference_id: Option<String>,
}

impl SearchFilters {
    pub fn to_qdrant(&self) -> Filter {
        let mut must = Vec::new();

        if !self.court.is_empty() {
            must.push(Condition::matches("court", self.court.clone()));
        }
        if !self.division.is_empty() {
            must.push(Condition::matches("division", self.division.clone()));
        }
        if !self.legislation_type.is_empty() {
            must.push(Condition::matches("legislation_type", self.legislation_type.clone()));
        }
        if self.year_min.is_some() || self.year_max.is_some() {
            must.push(Condition::range(
                "year",
                Range {
                    gte: self.year_min.map(|y| y as f64),
                    lte: self.year_max.map(|y| y as f64),
                    ..Default::default()
                },
            ));
        }
        if let Some(id) = &self.legislation_id {
            must.push(Condition::matches("legislation_id", id.clone()));
        }
        if let (Some(field), Some(reference_id)) = (self.reference_field, &self.reference_id) {
            must.push(Condition::matches(field, vec![reference_id.clone()]));
        }

        Filter::must(must)
    }
}

/// A retrieved point with its payload still encoded; callers decode with
/// [`crate::payload::payload_to_record`] into the kind-specific record type.
pub struct FoundPoint {
    pub id: String,
    pub payload: HashMap<String, QdrantValue>,
}

fn sparse_to_vector(sparse: &SparseVector) -> Vector {
    Vector::new_sparse(sparse.indices.clone(), sparse.values.clone())
}

fn point_id_to_string(id: Option<PointId>) -> String {
    match id.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

/// Hybrid search: dense + sparse prefetches fused with reciprocal-rank
/// fusion. Qdrant's RRF applies its own fixed k; no client-side parameter.
pub async fn hybrid_search(
    store: &VectorStore,
    collection: &str,
    dense: Vec<f32>,
    sparse: &SparseVector,
    filters: &SearchFilters,
    limit: u64,
    offset: u64,
) -> Result<Vec<FoundPoint>, StoreError> {
    let filter = filters.to_qdrant();
    let prefetch_limit = limit + offset;

    let dense_prefetch = PrefetchQueryBuilder::default()
        .query(Query::new_nearest(dense))
        .using("dense")
        .filter(filter.clone())
        .limit(prefetch_limit)
        .build();

    let sparse_prefetch = PrefetchQueryBuilder::default()
        .query(Query::new_nearest(sparse_to_vector(sparse)))
        .using("sparse")
        .filter(filter.clone())
        .limit(prefetch_limit)
        .build();

    let response = store
        .client
        .query(
            QueryPointsBuilder::new(collection)
                .add_prefetch(dense_prefetch)
                .add_prefetch(sparse_prefetch)
                .query(Query::new_fusion(Fusion::Rrf))
                .filter(filter)
                .limit(limit)
                .offset(offset)
                .with_payload(true),
        )
        .await?;

    Ok(response
        .result
        .into_iter()
        .map(|point| FoundPoint { id: point_id_to_string(point.id), payload: point.payload })
        .collect())
}

/// Keyword search: sparse-only, same filter shape as hybrid.
pub async fn keyword_search(
    store: &VectorStore,
    collection: &str,
    sparse: &SparseVector,
    filters: &SearchFilters,
    limit: u64,
    offset: u64,
) -> Result<Vec<FoundPoint>, StoreError> {
    let response = store
        .client
        .query(
            QueryPointsBuilder::new(collection)
                .query(Query::new_nearest(sparse_to_vector(sparse)))
                .using("sparse")
                .filter(filters.to_qdrant())
                .limit(limit)
                .offset(offset)
                .with_payload(true),
        )
        .await?;

    Ok(response
        .result
        .into_iter()
        .map(|point| FoundPoint { id: point_id_to_string(point.id), payload: point.payload })
        .collect())
}

/// No-query search: filters only, scrolled in point-id order.
pub async fn filter_search(
    store: &VectorStore,
    collection: &str,
    filters: &SearchFilters,
    limit: u32,
) -> Result<Vec<FoundPoint>, StoreError> {
    let response = store
        .client
        .scroll(
            ScrollPointsBuilder::new(collection)
                .filter(filters.to_qdrant())
                .limit(limit)
                .with_payload(true),
        )
        .await?;

    Ok(response
        .result
        .into_iter()
        .map(|point| FoundPoint { id: point_id_to_string(point.id), payload: point.payload })
        .collect())
}

/// Reference search: every record whose `caselaw_references` or
/// `legislation_references` list contains `reference_id`.
pub async fn reference_search(
    store: &VectorStore,
    collection: &str,
    field: &'static str,
    reference_id: &str,
    limit: u32,
) -> Result<Vec<FoundPoint>, StoreError> {
    let filters = SearchFilters {
        reference_field: Some(field),
        reference_id: Some(reference_id.to_string()),
        ..Default::default()
    };
    filter_search(store, collection, &filters, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_produce_empty_must_clause() {
        let filters = SearchFilters::default();
        let filter = filters.to_qdrant();
        assert!(filter.must.is_empty());
    }

    #[test]
    fn year_range_only_sets_the_bound_given() {
        let filters = SearchFilters { year_min: Some(2000), ..Default::default() };
        let filter = filters.to_qdrant();
        assert_eq!(filter.must.len(), 1);
    }

    /// spec.md §8 scenario 5: filter shape `reference_search` builds for a
    /// `legislation_references` lookup — a single must-clause scoping to the
    /// reference id, matching what a case citing it (and no other case)
    /// would satisfy. Whether Qdrant actually returns the right points for
    /// that filter is a live-store behaviour, not asserted here.
    #[test]
    fn reference_filter_scopes_to_exactly_the_reference_id() {
        let filters = SearchFilters {
            reference_field: Some("legislation_references"),
            reference_id: Some("http://www.legislation.gov.uk/id/ukpga/2018/12".to_string()),
            ..Default::default()
        };
        assert_eq!(filters.to_qdrant().must.len(), 1);
    }

    #[test]
    fn reference_filter_is_absent_without_both_field_and_id() {
        let field_only = SearchFilters {
            reference_field: Some("legislation_references"),
            ..Default::default()
        };
        assert!(field_only.to_qdrant().must.is_empty());
    }
}
