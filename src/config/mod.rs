mod defaults;
mod loader;

pub use defaults::ExplorerConfig;
pub use loader::{get_default_config, load_configuration, load_explorer_config, write_config_to};
