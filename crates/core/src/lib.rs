//! Core business logic for opencourse.

pub mod services;

pub use services::*;
