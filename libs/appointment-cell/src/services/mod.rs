pub mod booking;
pub mod lifecycle;
pub mod queue;
pub mod slots;
pub mod tokens;
