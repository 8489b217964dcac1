//! Outer surfaces: CSV scenario input and outcome output.

pub mod csv;
