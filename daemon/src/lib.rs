//! The bridge process: an HTTP control surface on one side, RM209 tally
//! datagrams on the other, with a background keepalive loop in between.

pub mod config;
pub mod refresh;
pub mod server;
pub mod state;
pub mod transport;
