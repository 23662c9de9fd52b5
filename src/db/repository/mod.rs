pub mod appointment;
pub mod doctor;
pub mod document;
pub mod patient;
pub mod prescription;
