// cowrite-common: shared types and utilities for the CoWrite workspace

pub mod path;
pub mod protocol;
pub mod types;
