//! Application layer: executing finalized specs against a host.
//!
//! The [`dispatcher::Dispatcher`] is the entry point. It assembles the
//! envelope, consults any attached host error simulation, calls the
//! transport and hands the reply to the [`interpreter`]. The
//! [`scenario::ScenarioRunner`] drives it step by step for the CLI.

pub mod dispatcher;
pub mod interpreter;
pub mod scenario;
