use crate::domain::value_objects::MemberId;
use crate::ports::member_service::{MemberService as MemberServiceTrait, Recipient, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_recipient(row: &PgRow) -> Recipient {
    Recipient {
        member_id: MemberId::from_uuid(row.get("member_id")),
        display_name: row.get("display_name"),
        email: row.get("email"),
    }
}

/// 会員ディレクトリ（membersテーブル）を参照するMemberService
///
/// 会員の登録・編集は会員コンテキスト側の責務。ここでは読むだけ。
pub struct MemberService {
    pool: PgPool,
}

impl MemberService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberServiceTrait for MemberService {
    async fn exists(&self, member_id: MemberId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE member_id = $1)")
                .bind(member_id.value())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get_contact(&self, member_id: MemberId) -> Result<Option<Recipient>> {
        let row = sqlx::query(
            "SELECT member_id, display_name, email FROM members WHERE member_id = $1",
        )
        .bind(member_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_recipient))
    }

    async fn list_administrators(&self) -> Result<Vec<Recipient>> {
        let rows = sqlx::query(
            "SELECT member_id, display_name, email FROM members WHERE is_admin ORDER BY display_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_recipient).collect())
    }
}
