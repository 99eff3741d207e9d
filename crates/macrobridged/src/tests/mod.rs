//! Test suites for the command server.

mod behaviour;
mod support;
