pub mod changeset;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod order;
pub mod reservation;
pub mod value_objects;

pub use changeset::*;
pub use errors::*;
pub use value_objects::*;
