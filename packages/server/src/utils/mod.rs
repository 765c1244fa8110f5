pub mod clock;
pub mod config;
pub mod session;
pub mod test_setup;
pub mod websocket;
