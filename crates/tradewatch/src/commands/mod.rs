//! Command implementations for the tradewatch CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod init;
pub mod options;
pub mod run;
