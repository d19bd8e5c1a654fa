pub mod activity_log;
pub mod book_service;
pub mod loan_repository;
pub mod member_service;
pub mod order_store;
pub mod reservation_store;

// パブリックに型を再エクスポート
pub use activity_log::ActivityLog as PostgresActivityLog;
pub use book_service::BookService as PostgresBookService;
pub use loan_repository::LoanRepository as PostgresLoanRepository;
pub use member_service::MemberService as PostgresMemberService;
pub use order_store::OrderStore as PostgresOrderStore;
pub use reservation_store::ReservationStore as PostgresReservationStore;

/// DBの値がドメインの型に変換できない場合のエラー
fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// `migrations/` のマイグレーションを適用する
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
