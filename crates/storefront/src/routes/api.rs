//! JSON endpoints used by page scripts.

use axum::{
    Json,
    extract::{Query, State},
};
use bazaar_core::ProductId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::backend::ListQuery;
use crate::state::AppState;

/// Shortest query that reaches the backend.
const MIN_QUERY_LEN: usize = 2;

/// Suggestions returned per query.
const MAX_SUGGESTIONS: u32 = 6;

/// Search box query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// One search-as-you-type suggestion.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Suggestion {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub image: String,
    pub url: String,
}

/// Product suggestions for the header search box.
///
/// Short queries and backend failures both answer with an empty list; the
/// box falls back to a full search on submit.
#[instrument(skip(state), fields(q = %query.q))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Suggestion>> {
    let q = query.q.trim();
    if q.chars().count() < MIN_QUERY_LEN {
        return Json(Vec::new());
    }

    let list = ListQuery {
        page: Some(1),
        limit: Some(MAX_SUGGESTIONS),
        search: Some(q.to_owned()),
        ..ListQuery::default()
    };
    match state.backend().get_products(&list).await {
        Ok(page) => Json(
            page.items
                .into_iter()
                .map(|product| Suggestion {
                    url: format!("/products/{}", product.id),
                    price: product.price.to_string(),
                    id: product.id,
                    name: product.name,
                    image: product.image,
                })
                .collect(),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Search suggestions failed");
            Json(Vec::new())
        }
    }
}
