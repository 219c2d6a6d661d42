pub mod master;
pub mod worker;

pub use master::{Master, serve};
pub use worker::handle_connection;
