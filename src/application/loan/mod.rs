mod errors;
mod loan_notifier;
mod loan_service;
mod reminder_scheduler;

pub use errors::{LoanApplicationError, Result};
pub use loan_notifier::LoanNotifier;
pub use loan_service::{
    LoanPipeline, ServiceDependencies, activate_loan, approve_loan, get_loan, list_member_loans,
    reject_loan, request_loan, return_loan,
};
pub use reminder_scheduler::{
    DEFAULT_REMINDER_DAYS, DueSoonLoan, ReminderOptions, ReminderReport, find_due_soon_loans,
    run_loan_reminders,
};
