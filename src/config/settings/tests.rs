use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.models.default_model, "markov");
    assert_eq!(config.models.default_embedding_model, "hashing");
    assert_eq!(config.markov.length, 100);
    assert_eq!(config.hashing.dimension, 64);
    assert!(!config.ollama.enabled);
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.embedding_dimension, None);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.models.default_model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.markov.length = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.hashing.dimension = 4097;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.ollama.retry_attempts = 0;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn invalid_ollama_and_model_values() {
    let mut config = Config::default();
    config.ollama.protocol = "ftp".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidProtocol(_))));

    let mut config = Config::default();
    config.ollama.port = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));

    let mut config = Config::default();
    config.ollama.embedding_dimension = Some(0);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidEmbeddingDimension(0))
    ));

    let mut config = Config::default();
    config.models.default_embedding_model = "   ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidModel(_))));
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("missing config should load defaults");
    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.models, ModelsConfig::default());
    assert_eq!(config.ollama, OllamaConfig::default());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config {
        base_dir: temp_dir.path().join("nested"),
        ..Config::default()
    };
    config.ollama.enabled = true;
    config.ollama.embedding_dimension = Some(384);
    config.hashing.dimension = 16;

    config.save().expect("should save config");
    assert!(config.config_file_path().exists());

    let loaded = Config::load(temp_dir.path().join("nested")).expect("should load saved config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[hashing]\ndimension = 0\n",
    )
    .expect("should write config file");

    let result = Config::load(temp_dir.path());
    assert!(result.is_err());
}

#[test]
#[serial]
fn config_dir_honors_env_override() {
    // SAFETY: serialized with the other tests that touch process environment
    unsafe { std::env::set_var("TSELLM_HOME", "/tmp/tsellm-custom") };
    let dir = Config::config_dir();
    // SAFETY: see above
    unsafe { std::env::remove_var("TSELLM_HOME") };

    assert_eq!(
        dir.expect("config dir should resolve"),
        PathBuf::from("/tmp/tsellm-custom")
    );
}

#[test]
fn https_url_generation() {
    let config = OllamaConfig {
        protocol: "https".to_string(),
        host: "models.example.com".to_string(),
        port: 443,
        ..OllamaConfig::default()
    };
    assert!(config.validate().is_ok());

    let url = config.ollama_url().expect("url should build");
    assert_eq!(url.as_str(), "https://models.example.com/");
}
