//! COA lookup tools

use serde::Serialize;

use crate::api::{CoaQuery, CoaSource};
use crate::models::{filter_by_ingredient_name, CoaSummary};

#[derive(Debug, Serialize)]
pub struct CoaListResponse {
    pub coas: Vec<CoaSummary>,
    pub count: usize,
    pub total: i64,
}

/// List COAs available for picking. The search term is sent to the server
/// and also applied locally, since older backends ignore it.
pub async fn list_coas<S: CoaSource + ?Sized>(
    source: &S,
    search: Option<String>,
    status: Option<String>,
    limit: usize,
) -> Result<CoaListResponse, String> {
    let query = CoaQuery {
        search: search.clone(),
        status,
        ..CoaQuery::with_limit(limit)
    };
    let list = source
        .list_coas(&query)
        .await
        .map_err(|e| format!("Failed to load COAs: {}", e))?;

    let coas: Vec<CoaSummary> = match search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => filter_by_ingredient_name(&list.coas, term)
            .into_iter()
            .cloned()
            .collect(),
        _ => list.coas,
    };

    Ok(CoaListResponse {
        count: coas.len(),
        total: list.total,
        coas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::coa::memory::MemoryCoaSource;
    use crate::models::CoaRecord;

    fn source() -> MemoryCoaSource {
        ["Whey Protein", "Rolled Oats", "whey isolate"]
            .iter()
            .enumerate()
            .fold(MemoryCoaSource::default(), |s, (i, name)| {
                s.with_coa(CoaRecord {
                    id: format!("c{}", i),
                    ingredient_name: name.to_string(),
                    ..Default::default()
                })
            })
    }

    #[tokio::test]
    async fn test_list_coas_filters_by_name() {
        let resp = list_coas(&source(), Some("WHEY".into()), None, 500).await.unwrap();
        assert_eq!(resp.count, 2);
        assert!(resp.coas.iter().all(|c| c.ingredient_name.to_lowercase().contains("whey")));
    }

    #[tokio::test]
    async fn test_list_coas_respects_limit() {
        let resp = list_coas(&source(), None, None, 2).await.unwrap();
        assert_eq!(resp.count, 2);
        let resp = list_coas(&source(), Some("  ".into()), None, 500).await.unwrap();
        assert_eq!(resp.count, 3);
    }
}
