pub mod loader;
pub mod schema;

pub use loader::{
    config_path_from_env, load_config, load_config_from_str, load_config_or_default,
    CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE,
};
pub use schema::{
    Config, FfmpegConfig, LogFormat, LoggingConfig, OpenAiConfig, PipelineConfig, ServerConfig,
    StorageConfig,
};
