// src/internal/diagnostics/mod.rs

pub mod diagnostics;

pub use diagnostics::{build_filter, init_diagnostics};
