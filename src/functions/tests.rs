use super::*;
use crate::config::Config;
use serial_test::serial;

#[test]
fn sqlite_table_has_both_arities() {
    let names: Vec<String> = SQLITE_FUNCTIONS.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["generate/2", "generate/1", "embed/2", "embed/1"]);
}

#[test]
fn duckdb_table_has_explicit_model_forms_only() {
    assert_eq!(DUCKDB_FUNCTIONS.len(), 2);
    assert!(DUCKDB_FUNCTIONS.iter().all(FunctionSpec::takes_model));
}

#[test]
fn determinism_flags() {
    for spec in SQLITE_FUNCTIONS.iter().chain(DUCKDB_FUNCTIONS) {
        match spec.kind {
            FunctionKind::Generate => assert!(!spec.deterministic, "{spec} should be volatile"),
            FunctionKind::Embed => assert!(spec.deterministic, "{spec} should be deterministic"),
        }
    }
}

#[test]
fn signatures_name_their_arguments() {
    assert_eq!(SQLITE_FUNCTIONS[0].signature(), "generate(prompt, model)");
    assert_eq!(SQLITE_FUNCTIONS[1].signature(), "generate(prompt)");
    assert_eq!(SQLITE_FUNCTIONS[3].signature(), "embed(text)");
}

#[test]
fn generate_uses_default_model() {
    let models = ModelRegistry::default();
    let explicit = invoke(&models, FunctionKind::Generate, "hello there", Some("markov"))
        .expect("generate should succeed");
    let implicit = invoke(&models, FunctionKind::Generate, "hello there", None)
        .expect("generate should succeed");
    assert_eq!(explicit, implicit);
    assert_eq!(implicit, "hello there");
}

#[test]
fn embed_returns_json_array() {
    let mut config = Config::default();
    config.hashing.dimension = 8;
    let models = ModelRegistry::builtin(&config);

    let json = invoke(&models, FunctionKind::Embed, "hello", None).expect("embed should succeed");
    let values: Vec<f32> = serde_json::from_str(&json).expect("output should be a JSON array");
    assert_eq!(values.len(), 8);
}

#[test]
fn unknown_model_is_an_error() {
    let models = ModelRegistry::default();
    let error = invoke(&models, FunctionKind::Generate, "hi", Some("nope"))
        .expect_err("unknown model should fail");
    assert_eq!(error.to_string(), "Unknown model: nope");
}

#[test]
#[serial]
fn installed_registry_is_active() {
    let mut config = Config::default();
    config.hashing.dimension = 3;
    install(Arc::new(ModelRegistry::builtin(&config)));

    let embedding = active()
        .embed("hello", "hashing")
        .expect("embed should succeed");
    assert_eq!(embedding.len(), 3);

    install(Arc::new(ModelRegistry::default()));
    let embedding = active()
        .embed("hello", "hashing")
        .expect("embed should succeed");
    assert_eq!(embedding.len(), 64);
}
