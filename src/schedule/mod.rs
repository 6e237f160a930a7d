//! Pure scheduling computations: candidate slot generation against
//! business hours and free/busy availability checking. Nothing in this
//! module touches the database or performs IO.

pub mod availability;
pub mod grid;

pub use availability::{AttendeeAvailability, BusyEvent, SlotAvailability, check_availability};
pub use grid::{BusinessHours, Slot, generate_slots};
