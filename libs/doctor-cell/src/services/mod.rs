pub mod doctor;
pub mod overrides;
pub mod schedule;
