//! Domain types shared by the builder, the network renderers and the
//! dispatcher.

pub mod money;
pub mod operation;
pub mod ports;
pub mod reference;
pub mod simulation;
pub mod spec;
pub mod tags;
pub mod tracking;
