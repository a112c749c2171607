//! Relay payload frames and admin-facing wire events.

pub mod events;
pub mod frame;
