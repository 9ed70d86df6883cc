pub mod models;
pub mod services;
pub mod handlers;
pub mod router;

pub use router::create_appointment_router;
