//! Command implementations

pub mod completions;
pub mod init;
pub mod machine;
pub mod mov;
pub mod order;
pub mod prod;
pub mod stock;
pub mod sync;
