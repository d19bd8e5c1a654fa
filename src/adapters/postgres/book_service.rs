use crate::domain::value_objects::BookId;
use crate::ports::book_service::{BookService as BookServiceTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// カタログ（booksテーブル）を参照するBookService
pub struct BookService {
    pool: PgPool,
}

impl BookService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookServiceTrait for BookService {
    /// 在庫が1冊以上あれば貸出可能
    async fn is_available_for_loan(&self, book_id: BookId) -> Result<bool> {
        let available: Option<i32> =
            sqlx::query_scalar("SELECT available_copies FROM books WHERE book_id = $1")
                .bind(book_id.value())
                .fetch_optional(&self.pool)
                .await?;
        Ok(available.is_some_and(|copies| copies > 0))
    }

    async fn get_book_title(&self, book_id: BookId) -> Result<String> {
        let title: Option<String> = sqlx::query_scalar("SELECT title FROM books WHERE book_id = $1")
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await?;
        title.ok_or_else(|| format!("book {} not found", book_id).into())
    }
}
