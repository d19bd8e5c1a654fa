use crate::application::{
    AppServices,
    errors::StatusUpdateError,
    loan::{self as loan_service, ReminderOptions},
    order as order_service, reservation as reservation_service,
};
use crate::domain::{
    commands::*, order::OrderAction, reservation::ReservationAction, value_objects::*,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{error::ApiError, types::*};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    /// リマインダーの日数が指定されなかった場合の既定値
    pub reminder_days: u32,
}

// ============================================================================
// Loan commands (POST)
// ============================================================================

/// POST /loans - 貸出を申請
///
/// 強制されるビジネスルール:
/// - 会員が存在すること
/// - 書籍が貸出可能であること
pub async fn request_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let loan = loan_service::request_loan(&state.services.loans, req.to_command()).await?;
    Ok((StatusCode::CREATED, Json(LoanResponse::from(loan))))
}

/// POST /loans/:id/approve - 貸出申請を承認
pub async fn approve_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
    Json(req): Json<ApproveLoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ApproveLoan {
        loan_id: LoanId::from_uuid(loan_id),
        staff_id: StaffId::from_uuid(req.staff_id),
        due_date: req.due_date,
    };
    let loan = loan_service::approve_loan(&state.services.loans, cmd).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/reject - 貸出申請を却下
///
/// 理由を省略した場合は既定の文言が記録・通知される。
pub async fn reject_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
    Json(req): Json<RejectLoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = RejectLoan {
        loan_id: LoanId::from_uuid(loan_id),
        staff_id: StaffId::from_uuid(req.staff_id),
        reason: req.reason,
    };
    let loan = loan_service::reject_loan(&state.services.loans, cmd).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/activate - 貸出を開始（書籍の受け渡し）
pub async fn activate_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
    Json(req): Json<ActivateLoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ActivateLoan {
        loan_id: LoanId::from_uuid(loan_id),
        staff_id: StaffId::from_uuid(req.staff_id),
        due_date: req.due_date,
    };
    let loan = loan_service::activate_loan(&state.services.loans, cmd).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/return - 書籍を返却
///
/// 延滞中の貸出も返却可能。
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
    Json(req): Json<ReturnLoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ReturnLoan {
        loan_id: LoanId::from_uuid(loan_id),
        staff_id: StaffId::from_uuid(req.staff_id),
    };
    let loan = loan_service::return_loan(&state.services.loans, cmd).await?;
    Ok(Json(LoanResponse::from(loan)))
}

// ============================================================================
// Loan queries (GET)
// ============================================================================

/// GET /loans/:id - 貸出詳細をIDで取得
pub async fn get_loan_by_id(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = loan_service::get_loan(&state.services.loans, LoanId::from_uuid(loan_id)).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// GET /loans - 会員の貸出一覧
///
/// クエリパラメータ:
/// - member_id: 会員IDでフィルタリング（必須）
/// - status: ステータスでフィルタリング（オプション）
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let member_id = query
        .member_id
        .map(MemberId::from_uuid)
        .ok_or_else(|| ApiError::BadRequest("member_id query parameter is required".to_string()))?;

    let status = query
        .status
        .as_deref()
        .map(parse_status_filter)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let loans = loan_service::list_member_loans(&state.services.loans, member_id, status).await?;
    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

// ============================================================================
// Reservations and orders
// ============================================================================

/// POST /reservations - 予約を受け付ける
pub async fn place_reservation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let reservation = reservation_service::place_reservation(
        &state.services.reservations,
        BookId::from_uuid(req.book_id),
        MemberId::from_uuid(req.member_id),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ReservationResponse::from(reservation))))
}

/// POST /reservations/:id/:action - confirm / ready / complete / cancel
pub async fn update_reservation(
    State(state): State<Arc<AppState>>,
    Path((reservation_id, action)): Path<(Uuid, String)>,
    body: Option<Json<StatusActionRequest>>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let action: ReservationAction = action.parse().map_err(StatusUpdateError::UnknownAction)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let reservation = reservation_service::update_reservation(
        &state.services.reservations,
        ReservationId::from_uuid(reservation_id),
        action,
        req.staff_id.map(StaffId::from_uuid),
        req.reason.as_deref(),
    )
    .await?;
    Ok(Json(ReservationResponse::from(reservation)))
}

/// POST /orders/:id/:action - pay / ship / deliver / cancel
pub async fn update_order(
    State(state): State<Arc<AppState>>,
    Path((order_id, action)): Path<(Uuid, String)>,
    body: Option<Json<StatusActionRequest>>,
) -> Result<Json<OrderResponse>, ApiError> {
    let action: OrderAction = action.parse().map_err(StatusUpdateError::UnknownAction)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let order = order_service::update_order(
        &state.services.orders,
        OrderId::from_uuid(order_id),
        action,
        req.staff_id.map(StaffId::from_uuid),
        req.reason.as_deref(),
    )
    .await?;
    Ok(Json(OrderResponse::from(order)))
}

// ============================================================================
// Admin
// ============================================================================

/// POST /admin/loan-reminders - リマインダー送信と延滞検出を実行
///
/// 個別の失敗があっても200で件数を返す。
pub async fn run_loan_reminders(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ReminderRunRequest>>,
) -> Result<Json<ReminderRunResponse>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let options = ReminderOptions {
        days: req.days.unwrap_or(state.reminder_days),
        dry_run: req.dry_run,
    };

    let report = loan_service::run_loan_reminders(&state.services.loans, options).await?;
    Ok(Json(ReminderRunResponse::new(report, options.dry_run)))
}
