//! The RPC methods of the protocol. Each module defines the method name and
//! the parameter and result types of one method.

pub mod conda_metadata;
pub mod initialize;
