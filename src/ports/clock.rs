use chrono::{DateTime, NaiveDate, Utc};

/// 時計ポート
///
/// 「今」「今日」をテストから差し替えられるようにする。
/// 延滞判定やリマインダー対象の抽出はすべてこの時計を基準にする。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// UTC基準の今日の日付
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
