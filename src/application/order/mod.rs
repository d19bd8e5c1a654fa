mod order_notifier;
mod order_service;

pub use order_notifier::OrderNotifier;
pub use order_service::{OrderDependencies, OrderPipeline, update_order};
