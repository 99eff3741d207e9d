//! Crate-level tests for macrobridge-syntax.
