//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bazaar_core::ProductId;
use tracing::instrument;

use crate::backend::{BackendError, Page, Product};
use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::{ListParams, PageContext, Pager};
use crate::state::AppState;

/// Products per listing page.
const PAGE_SIZE: u32 = 12;

/// Sort choices offered in the listing, as `(backend value, label)`.
pub const SORT_OPTIONS: [(&str, &str); 4] = [
    ("", "Newest"),
    ("price_asc", "Price: low to high"),
    ("price_desc", "Price: high to low"),
    ("popular", "Most popular"),
];

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<Product>,
    pub params: ListParams,
    pub sort_options: &'static [(&'static str, &'static str)],
    pub pager: Pager,
    pub error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: Product,
}

/// Display the product listing.
///
/// A backend failure renders the page with a notice rather than an error page.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = params.to_query(PAGE_SIZE);
    let (page, error) = match state.backend().get_products(&query).await {
        Ok(page) => (page, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products");
            (Page::single(Vec::new()), Some(e.user_message()))
        }
    };

    ProductsIndexTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/products"),
        products: page.items,
        params,
        sort_options: &SORT_OPTIONS,
        error,
    }
}

/// Display a product.
#[instrument(skip(state, ctx), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.backend().get_product(&id).await.map_err(|e| match e {
        BackendError::NotFound(_) => AppError::NotFound(format!("product {id}")),
        other => AppError::Backend(other),
    })?;

    Ok(ProductShowTemplate { ctx, product })
}
