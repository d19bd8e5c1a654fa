pub mod clock;
pub mod mock;
pub mod postgres;
pub mod smtp;

pub use clock::SystemClock;
