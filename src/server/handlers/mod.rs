//! HTTP handlers for the relay server.

pub mod printer;
