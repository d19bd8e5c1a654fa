use crate::domain::value_objects::BookId;
use crate::ports::book_service::{BookService as BookServiceTrait, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// BookServiceのモック実装
///
/// 貸出可能な書籍とタイトルを登録できる。
pub struct BookService {
    available_books: Mutex<HashSet<BookId>>,
    titles: Mutex<HashMap<BookId, String>>,
}

impl BookService {
    pub fn new() -> Self {
        Self {
            available_books: Mutex::new(HashSet::new()),
            titles: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に貸出可能な書籍を登録
    pub fn add_available_book(&self, book_id: BookId, title: &str) {
        self.available_books.lock().unwrap().insert(book_id);
        self.titles
            .lock()
            .unwrap()
            .insert(book_id, title.to_string());
    }

    /// 在庫切れにする（タイトルは残す）
    pub fn mark_unavailable(&self, book_id: BookId) {
        self.available_books.lock().unwrap().remove(&book_id);
    }
}

impl Default for BookService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookServiceTrait for BookService {
    async fn is_available_for_loan(&self, book_id: BookId) -> Result<bool> {
        Ok(self.available_books.lock().unwrap().contains(&book_id))
    }

    /// 未登録の書籍は固定のタイトルを返す
    async fn get_book_title(&self, book_id: BookId) -> Result<String> {
        Ok(self
            .titles
            .lock()
            .unwrap()
            .get(&book_id)
            .cloned()
            .unwrap_or_else(|| "Mock Book Title".to_string()))
    }
}
