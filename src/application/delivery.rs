use crate::domain::value_objects::{BookId, MemberId};
use crate::ports::{BookService, MemberService, NotificationKind, Recipient};
use std::fmt;
use thiserror::Error;

/// 1件の通知送信の失敗
///
/// 呼び出し元へは伝播させず、記録だけして次の通知へ進む。再送はしない。
#[derive(Debug, Error)]
#[error("failed to deliver {kind} notification to {recipient}")]
pub struct NotificationDeliveryFailure {
    pub kind: NotificationKind,
    pub recipient: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// 送信結果を記録する
///
/// 成功なら true。失敗は `NotificationDeliveryFailure` として warn ログに残す。
pub(crate) fn report_delivery(
    kind: NotificationKind,
    recipient: &str,
    entity_id: impl fmt::Display,
    result: Result<(), Box<dyn std::error::Error + Send + Sync>>,
) -> bool {
    match result {
        Ok(()) => true,
        Err(source) => {
            let failure = NotificationDeliveryFailure {
                kind,
                recipient: recipient.to_string(),
                source,
            };
            tracing::warn!(
                entity_id = %entity_id,
                error = %failure,
                cause = %failure.source,
                "notification delivery failed"
            );
            false
        }
    }
}

/// 会員の通知先を取得する（見つからなければ記録して None）
pub(crate) async fn lookup_contact(
    member_service: &dyn MemberService,
    member_id: MemberId,
) -> Option<Recipient> {
    match member_service.get_contact(member_id).await {
        Ok(Some(recipient)) => Some(recipient),
        Ok(None) => {
            tracing::warn!(%member_id, "member has no contact, skipping notification");
            None
        }
        Err(e) => {
            tracing::warn!(%member_id, error = %e, "failed to look up member contact");
            None
        }
    }
}

/// 通知に載せる書籍タイトル（取得できなければ書籍ID）
pub(crate) async fn lookup_title(book_service: &dyn BookService, book_id: BookId) -> String {
    match book_service.get_book_title(book_id).await {
        Ok(title) => title,
        Err(e) => {
            tracing::warn!(%book_id, error = %e, "failed to look up book title");
            book_id.to_string()
        }
    }
}
