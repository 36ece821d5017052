//! Wire types for the WhatsApp Cloud API.

pub mod send;
pub mod webhook;

pub use send::*;
pub use webhook::*;
