//! Domain layer: the reservation entity, its state machine, and the ports
//! the application layer depends on.

pub mod clock;
pub mod ports;
pub mod reservation;
