pub mod configuration;
pub use configuration::Config;

pub mod error_handling;

pub mod log_sink;

pub mod relay;

pub mod connection;
pub use connection::{Connection, ConnectionReport};

pub mod network;
pub use network::ProxyListener;
