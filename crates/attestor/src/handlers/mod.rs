//! Command handlers - extracted from main.rs for testability

pub mod init;
pub mod run;
pub mod validate;

pub use init::{execute_init, starter_scenario};
pub use run::{execute_run, overrides_from_args};
pub use validate::{execute_validate, validate_file};
