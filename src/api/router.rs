use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::*;

/// Creates the API router
///
/// Loans:
/// - POST /loans - Request a loan
/// - GET /loans?member_id=&status= - List a member's loans
/// - GET /loans/:id - Get loan details
/// - POST /loans/:id/{approve,reject,activate,return} - Staff transitions
///
/// Reservations and orders:
/// - POST /reservations
/// - POST /reservations/:id/:action
/// - POST /orders/:id/:action
///
/// Admin:
/// - POST /admin/loan-reminders - Due-soon reminders and overdue sweep
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Loans
        .route("/loans", post(request_loan).get(list_loans))
        .route("/loans/:id", get(get_loan_by_id))
        .route("/loans/:id/approve", post(approve_loan))
        .route("/loans/:id/reject", post(reject_loan))
        .route("/loans/:id/activate", post(activate_loan))
        .route("/loans/:id/return", post(return_loan))
        // Reservations and orders
        .route("/reservations", post(place_reservation))
        .route("/reservations/:id/:action", post(update_reservation))
        .route("/orders/:id/:action", post(update_order))
        // Admin
        .route("/admin/loan-reminders", post(run_loan_reminders))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
