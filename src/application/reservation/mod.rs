mod reservation_notifier;
mod reservation_service;

pub use reservation_notifier::ReservationNotifier;
pub use reservation_service::{
    ReservationDependencies, ReservationPipeline, place_reservation, update_reservation,
};
