//! Blocking child-process execution.
//!
//! Used by the component loader to run legacy entry scripts and by the mail
//! crate to hand messages to a local `sendmail` binary.

pub mod command;

pub use command::{run_piped, CommandSpec, ShellError};
