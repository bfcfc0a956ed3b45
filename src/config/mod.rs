// Configuration management module
// Model provider settings live in a TOML file under the config directory

pub mod display;
pub mod settings;


pub use display::{init_config, show_config};
pub use settings::{
    Config, ConfigError, HashingConfig, MarkovConfig, ModelsConfig, OllamaConfig,
};
