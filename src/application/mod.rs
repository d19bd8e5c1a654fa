pub mod audit;
pub mod commit;
pub mod delivery;
pub mod errors;
pub mod loan;
pub mod order;
pub mod reservation;

use crate::domain::{loan::Loan, order::Order, reservation::Reservation};
use crate::ports::*;
use std::sync::Arc;

use audit::ActivityRecorder;
use loan::{LoanNotifier, LoanPipeline, ServiceDependencies};
use order::{OrderDependencies, OrderNotifier, OrderPipeline};
use reservation::{ReservationDependencies, ReservationNotifier, ReservationPipeline};

/// アプリケーションが使うアダプター一式
#[derive(Clone)]
pub struct Adapters {
    pub loan_repository: Arc<dyn LoanRepository>,
    pub reservation_store: Arc<dyn EntityStore<Reservation>>,
    pub order_store: Arc<dyn EntityStore<Order>>,
    pub member_service: Arc<dyn MemberService>,
    pub book_service: Arc<dyn BookService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub activity_log: Arc<dyn ActivityLog>,
    pub clock: Arc<dyn Clock>,
}

/// 組み立て済みのサービス
#[derive(Clone)]
pub struct AppServices {
    pub loans: ServiceDependencies,
    pub reservations: ReservationDependencies,
    pub orders: OrderDependencies,
    pub activity_log: Arc<dyn ActivityLog>,
}

/// エンティティの種類ごとにパイプラインを作り、通知と監査ログのオブザーバーを登録する
///
/// オブザーバーは登録順（通知 → 監査ログ）に呼ばれる。
pub fn wire(adapters: Adapters) -> AppServices {
    let loan_pipeline = LoanPipeline::new(adapters.loan_repository.clone())
        .with_observer(Arc::new(LoanNotifier::new(
            adapters.member_service.clone(),
            adapters.book_service.clone(),
            adapters.notification_service.clone(),
        )))
        .with_observer(Arc::new(ActivityRecorder::<Loan>::new(
            adapters.activity_log.clone(),
        )));

    let reservation_pipeline = ReservationPipeline::new(adapters.reservation_store.clone())
        .with_observer(Arc::new(ReservationNotifier::new(
            adapters.member_service.clone(),
            adapters.book_service.clone(),
            adapters.notification_service.clone(),
        )))
        .with_observer(Arc::new(ActivityRecorder::<Reservation>::new(
            adapters.activity_log.clone(),
        )));

    let order_pipeline = OrderPipeline::new(adapters.order_store.clone())
        .with_observer(Arc::new(OrderNotifier::new(
            adapters.member_service.clone(),
            adapters.notification_service.clone(),
        )))
        .with_observer(Arc::new(ActivityRecorder::<Order>::new(
            adapters.activity_log.clone(),
        )));

    AppServices {
        loans: ServiceDependencies {
            loan_pipeline: Arc::new(loan_pipeline),
            member_service: adapters.member_service.clone(),
            book_service: adapters.book_service,
            notification_service: adapters.notification_service,
            clock: adapters.clock.clone(),
        },
        reservations: ReservationDependencies {
            pipeline: Arc::new(reservation_pipeline),
            member_service: adapters.member_service,
            clock: adapters.clock.clone(),
        },
        orders: OrderDependencies {
            pipeline: Arc::new(order_pipeline),
            clock: adapters.clock,
        },
        activity_log: adapters.activity_log,
    }
}
