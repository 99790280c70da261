//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::backend::{ListQuery, Product};
use crate::filters;
use crate::routes::PageContext;
use crate::state::AppState;

/// Number of products on the home page.
const FEATURED_COUNT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured: Vec<Product>,
    /// The backend could not be reached; show a notice instead of products.
    pub unavailable: bool,
}

/// Display the home page with the newest products.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let query = ListQuery {
        page: Some(1),
        limit: Some(FEATURED_COUNT),
        ..ListQuery::default()
    };

    let (featured, unavailable) = match state.backend().get_products(&query).await {
        Ok(page) => (page.items, false),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured products");
            (Vec::new(), true)
        }
    };

    HomeTemplate {
        ctx,
        featured,
        unavailable,
    }
}
