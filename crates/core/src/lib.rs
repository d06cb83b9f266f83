pub mod config;
pub mod document;
pub mod error;
pub mod local;
pub mod remote;
pub mod session;
pub mod workspace;
