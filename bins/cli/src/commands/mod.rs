//! CLI command handlers.

pub mod coding;
pub mod commit;
pub mod config;
pub mod family_code;
pub mod info;
pub mod next_serial;
pub mod preview;

pub use coding::CodingCommandInput;
pub use commit::run_commit;
pub use config::{run_config_check, run_config_show};
pub use family_code::run_family_code;
pub use info::run_info;
pub use next_serial::run_next_serial;
pub use preview::run_preview;
