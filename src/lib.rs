pub mod action;
pub mod data;
pub mod engine;
pub mod error;
pub mod executor;
pub mod scenario;
pub mod session;
pub mod steps;
