use crate::domain::{
    loan::{Loan, LoanStatus},
    value_objects::{LoanId, MemberId},
};
use crate::ports::entity_store::{EntityStore as EntityStoreTrait, Result};
use crate::ports::loan_repository::LoanRepository as LoanRepositoryTrait;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};

use super::entity_store::EntityStore;

/// In-memory implementation of LoanRepository
///
/// Wraps the generic in-memory store and answers the batch queries by scanning it.
pub struct LoanRepository {
    store: EntityStore<Loan>,
    fail_queries: AtomicBool,
}

impl LoanRepository {
    pub fn new() -> Self {
        Self {
            store: EntityStore::new(),
            fail_queries: AtomicBool::new(false),
        }
    }

    /// Store a loan in any state without going through the pipeline
    pub fn seed(&self, loan: Loan) {
        self.store.seed(loan);
    }

    pub fn fail_updates_for(&self, loan_id: LoanId) {
        self.store.fail_updates_for(loan_id);
    }

    /// Make the batch queries fail
    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, loan_id: LoanId) -> Option<Loan> {
        self.store.get(loan_id)
    }

    fn select(&self, predicate: impl Fn(&Loan) -> bool) -> Result<Vec<Loan>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err("simulated query failure".into());
        }
        let mut loans: Vec<Loan> = self.store.all().into_iter().filter(predicate).collect();
        loans.sort_by_key(|loan| (loan.due_date, loan.requested_at));
        Ok(loans)
    }
}

impl Default for LoanRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStoreTrait<Loan> for LoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<()> {
        self.store.insert(loan).await
    }

    async fn update(&self, loan: &Loan) -> Result<()> {
        self.store.update(loan).await
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        self.store.get_by_id(loan_id).await
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn find_active_due_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Loan>> {
        self.select(|loan| {
            loan.status == LoanStatus::Active
                && loan.due_date.is_some_and(|due| from <= due && due <= to)
        })
    }

    async fn find_active_due_before(&self, date: NaiveDate) -> Result<Vec<Loan>> {
        self.select(|loan| {
            loan.status == LoanStatus::Active && loan.due_date.is_some_and(|due| due < date)
        })
    }

    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Loan>> {
        let mut loans = self.select(|loan| loan.member_id == member_id)?;
        loans.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(loans)
    }
}
