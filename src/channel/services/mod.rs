//! Orchestration services for connection lifecycle.

mod connection;

pub use connection::{
    ChannelConnectionError, ChannelConnectionResult, ChannelConnectionService,
    ConnectChannelRequest,
};
