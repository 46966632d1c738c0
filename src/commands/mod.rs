//! CLI command implementations.
//!
//! - **select**: run the selection pipeline over method/file metainfo
//! - **inspect**: analyze the top-level functions of one Python file
//! - **init**: write a starter configuration file

pub mod init;
pub mod inspect;
pub mod select;

pub use init::init_config;
pub use inspect::{analyze_source, inspect_file, Classification, FunctionReport, InspectConfig};
pub use select::{resolve_config, resolve_settings, select_functions, SelectConfig};
