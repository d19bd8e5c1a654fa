use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ステータス遷移（遷移前 → 遷移後）
///
/// 通知はこの組をキーにして送信内容を決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub from: S,
    pub to: S,
}

impl<S> StatusChange<S> {
    pub fn new(from: S, to: S) -> Self {
        Self { from, to }
    }
}

/// コミット時の変更セット
///
/// 変更されたフィールド名の集合と、ステータスが変わった場合はその遷移を持つ。
/// 永続化の後にオブザーバーへ渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet<S> {
    status: Option<StatusChange<S>>,
    fields: BTreeSet<&'static str>,
}

impl<S: Copy + PartialEq> ChangeSet<S> {
    pub fn new() -> Self {
        Self {
            status: None,
            fields: BTreeSet::new(),
        }
    }

    /// フィールドの変更を記録する（値が同じなら何もしない）
    pub fn record<T: PartialEq>(&mut self, field: &'static str, before: &T, after: &T) {
        if before != after {
            self.fields.insert(field);
        }
    }

    /// ステータスの変更を記録する
    pub fn record_status(&mut self, before: S, after: S) {
        if before != after {
            self.status = Some(StatusChange::new(before, after));
            self.fields.insert("status");
        }
    }

    pub fn status_change(&self) -> Option<StatusChange<S>> {
        self.status
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Copy + PartialEq> Default for ChangeSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// コミットパイプラインで扱えるエンティティ
///
/// 貸出・予約・注文がそれぞれ実装し、種類ごとにオブザーバーを登録する。
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;
    type Status: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// 監査ログなどに記録する種類名
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    fn uuid(&self) -> Uuid;

    fn status(&self) -> Self::Status;

    /// 楽観的ロック用のバージョン
    fn version(&self) -> i32;

    fn set_version(&mut self, version: i32);

    /// 2つのスナップショットの差分を計算する
    fn diff(before: &Self, after: &Self) -> ChangeSet<Self::Status>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ignores_unchanged_values() {
        let mut changes: ChangeSet<u8> = ChangeSet::new();
        changes.record("notes", &Some("a"), &Some("a"));
        changes.record_status(1, 1);
        assert!(changes.is_empty());
        assert!(changes.status_change().is_none());
    }

    #[test]
    fn test_record_status_adds_status_field() {
        let mut changes: ChangeSet<u8> = ChangeSet::new();
        changes.record_status(1, 2);
        assert!(changes.contains("status"));
        assert_eq!(changes.status_change(), Some(StatusChange::new(1, 2)));
    }

    #[test]
    fn test_fields_are_sorted() {
        let mut changes: ChangeSet<u8> = ChangeSet::new();
        changes.record("returned_at", &None::<u8>, &Some(1));
        changes.record("approved_at", &None::<u8>, &Some(1));
        let fields: Vec<_> = changes.fields().collect();
        assert_eq!(fields, vec!["approved_at", "returned_at"]);
    }
}
