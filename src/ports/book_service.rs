use crate::domain::value_objects::BookId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍サービスポート
///
/// 貸出コンテキストはBookIDのみを知り、書籍詳細はカタログ側に問い合わせる。
#[async_trait]
pub trait BookService: Send + Sync {
    /// 貸出・予約を受け付けられる書籍か
    ///
    /// 貸出申請時は在庫がある場合のみ受け付ける。
    async fn is_available_for_loan(&self, book_id: BookId) -> Result<bool>;

    /// 通知文面に載せる書籍タイトル
    async fn get_book_title(&self, book_id: BookId) -> Result<String>;
}
