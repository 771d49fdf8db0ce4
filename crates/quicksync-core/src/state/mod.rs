//! OBEX response state machine.

pub mod machine;

pub use machine::{ObexVerdict, TransferOperation, classify};
