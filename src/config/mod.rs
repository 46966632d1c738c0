mod core;
mod loader;

pub use self::core::{
    BenchmineConfig, ComplexityConfig, SelectionConfig, DEFAULT_ALLOWED_LIBRARIES,
    DEFAULT_EXPANSION_DEPTH,
};
pub use loader::{
    directory_ancestors, load_config, load_config_file, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
