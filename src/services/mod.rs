// src/services/mod.rs
pub mod bus;
pub mod dashboard;
pub mod fetcher;
pub mod filters;
pub mod fundamentals;
pub mod merge;
pub mod portfolio;
pub mod scheduler;
pub mod sources;
pub mod symbols;
