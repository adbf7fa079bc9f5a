//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod bank_accounts;
pub mod customers;
pub mod health;
pub mod invoices;
pub mod search;
pub mod services;
pub mod transaction_categories;
pub mod transactions;
pub mod users;

/// Creates the API router with protected routes behind the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Everything except health and the auth endpoints requires a resolved
    // local user.
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(customers::routes())
        .merge(bank_accounts::routes())
        .merge(transaction_categories::routes())
        .merge(services::routes())
        .merge(invoices::routes())
        .merge(transactions::routes())
        .merge(search::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
