use crate::domain::value_objects::MemberId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知の宛先
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub member_id: MemberId,
    pub display_name: String,
    pub email: String,
}

/// 会員サービスポート
///
/// 貸出コンテキストと会員コンテキストの境界を維持する。
/// 貸出コンテキストはMemberIDと通知先だけを知り、会員詳細は知らない。
#[async_trait]
pub trait MemberService: Send + Sync {
    /// 会員が存在するか確認する
    ///
    /// 貸出申請・予約前の会員バリデーションに使用される。
    async fn exists(&self, member_id: MemberId) -> Result<bool>;

    /// 会員の通知先を取得する
    async fn get_contact(&self, member_id: MemberId) -> Result<Option<Recipient>>;

    /// 管理者全員の通知先を取得する
    ///
    /// 新しい貸出申請の通知に使用される。
    async fn list_administrators(&self) -> Result<Vec<Recipient>>;
}
