mod common;
mod protocol;
mod server;
