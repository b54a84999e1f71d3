//! Infrastructure layer: plate storage, configuration, lifecycle notifications
//! and the catalog engine that composes them.

pub mod catalog_engine;
pub mod config;
pub mod notifications;
pub mod plate_store;

mod integration_tests;
