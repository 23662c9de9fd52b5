pub mod appointments;
pub mod chat;
pub mod doctors;
pub mod documents;
pub mod health;
pub mod patients;
pub mod prescriptions;
