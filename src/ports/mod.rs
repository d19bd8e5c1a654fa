pub mod activity_log;
pub mod book_service;
pub mod clock;
pub mod entity_store;
pub mod loan_repository;
pub mod member_service;
pub mod notification_service;

pub use activity_log::{ActivityAction, ActivityLog, ActivityRecord};
pub use book_service::BookService;
pub use clock::Clock;
pub use entity_store::{EntityStore, StaleEntityError};
pub use loan_repository::LoanRepository;
pub use member_service::{MemberService, Recipient};
pub use notification_service::{NotificationKind, NotificationService};
