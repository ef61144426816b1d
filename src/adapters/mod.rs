//! Adapters exposing the system to the outside world.

pub mod http;
