//! インメモリのアダプター
//!
//! テストと開発用サーバー（`--in-memory`）で使用する。

pub mod activity_log;
pub mod book_service;
pub mod clock;
pub mod entity_store;
pub mod loan_repository;
pub mod member_service;
pub mod notification_service;

pub use activity_log::ActivityLog;
pub use book_service::BookService;
pub use clock::FixedClock;
pub use entity_store::EntityStore;
pub use loan_repository::LoanRepository;
pub use member_service::MemberService;
pub use notification_service::{NotificationService, SentNotification};
