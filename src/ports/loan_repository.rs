use crate::domain::{loan::Loan, value_objects::MemberId};
use async_trait::async_trait;
use chrono::NaiveDate;

use super::entity_store::{EntityStore, Result};

/// 貸出リポジトリポート
///
/// 基本的な保存・取得に加え、バッチ処理用の検索を提供する。
#[async_trait]
pub trait LoanRepository: EntityStore<Loan> {
    /// 返却期限が `from` 以上 `to` 以下の貸出中（Active）の貸出を返す
    ///
    /// 返却期限前リマインダーの対象抽出に使用される。
    async fn find_active_due_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Loan>>;

    /// 返却期限が `date` より前の貸出中（Active）の貸出を返す
    ///
    /// 延滞検出バッチに使用される。既にOverdueのものは含まない。
    async fn find_active_due_before(&self, date: NaiveDate) -> Result<Vec<Loan>>;

    /// 会員の全貸出を検索する（新しい申請順）
    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Loan>>;
}
