//! Multi-user location sharing server

pub mod auth;
pub mod config;
pub mod controller;
pub mod database;
pub mod inertia;
pub mod server;

#[cfg(test)]
mod test_support;

pub use server::{app, router, serve, AppState};
