//! CitaSalud backend: appointment marketplace for patients and doctors,
//! with PDF prescription generation, appointment documents and an FAQ chat
//! widget.

pub mod api;
pub mod chat;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod prescription;
