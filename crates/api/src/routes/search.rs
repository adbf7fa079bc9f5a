//! Global search route.
//!
//! One query fans out across the tenant's invoices, customers, bank
//! accounts, template services, and transactions; ADMIN callers also search
//! the global user directory. Kinds with no matches are omitted.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use faktura_db::SearchRepository;
use faktura_db::repositories::{SearchGroup, SearchItem};

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::CurrentUser;

/// Creates the search routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/search", get(global_search))
}

/// Query parameters for global search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring to look for.
    #[serde(default)]
    pub q: String,
}

/// One search hit.
#[derive(Debug, Serialize)]
pub struct SearchItemResponse {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
}

impl From<SearchItem> for SearchItemResponse {
    fn from(item: SearchItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            subtitle: item.subtitle,
        }
    }
}

/// All hits of one entity kind.
#[derive(Debug, Serialize)]
pub struct SearchGroupResponse {
    pub kind: &'static str,
    pub items: Vec<SearchItemResponse>,
}

impl From<SearchGroup> for SearchGroupResponse {
    fn from(group: SearchGroup) -> Self {
        Self {
            kind: group.kind,
            items: group.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// GET /search?q=... - Search across the tenant's records.
///
/// A blank query returns no groups rather than matching everything.
async fn global_search(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SearchGroupResponse>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let repo = SearchRepository::new((*state.db).clone());
    let groups = repo.global_search(auth.id(), q, auth.is_admin()).await?;
    Ok(Json(groups.into_iter().map(Into::into).collect()))
}
