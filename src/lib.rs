//! 図書館・書店アプリの貸出管理
//!
//! 貸出のライフサイクル（申請 → 承認 → 貸出中 → 返却、延滞）、
//! 遷移に応じた通知、返却期限前リマインダーと延滞検出のバッチを提供する。

pub mod adapters;
pub mod api;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
