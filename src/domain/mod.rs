//! Domain model: accounts, transfer requests and the ports the application
//! layer depends on.

pub mod account;
pub mod ports;
pub mod transfer;
