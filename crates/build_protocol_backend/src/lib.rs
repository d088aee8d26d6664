//! The backend side of the build protocol.
//!
//! A backend implements [`protocol::ProtocolInstantiator`] and
//! [`protocol::Protocol`] and hands them to [`cli::main`], which serves them
//! over json-rpc. Every request goes through a [`session::Session`] that
//! enforces the order of the methods and validates the payloads before any
//! backend code runs.

pub mod cli;
pub mod protocol;
pub mod server;
pub mod session;
