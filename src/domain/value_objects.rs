use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// UUIDをラップした識別子型を定義する
///
/// 各コンテキストのIDを別々の型にすることで、
/// 貸出IDと会員IDの取り違えをコンパイル時に防ぐ。
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// 貸出ID - 貸出管理コンテキストの集約ID
    LoanId
);

entity_id!(
    /// 書籍ID - カタログ管理コンテキストへの参照
    BookId
);

entity_id!(
    /// 会員ID - 会員管理コンテキストへの参照（借り手・購入者）
    MemberId
);

entity_id!(
    /// 職員ID - 操作を行った職員・管理者
    StaffId
);

entity_id!(
    /// 予約ID
    ReservationId
);

entity_id!(
    /// 注文ID
    OrderId
);
