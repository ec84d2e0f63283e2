use fakeforge_core::config::FakeforgeConfig;
use fakeforge_core::{GenerationRequest, ResolveMode};
use pretty_assertions::assert_eq;

#[test]
fn test_config_defaults_validate() {
    let config = FakeforgeConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.generation.fake_prefix, "Fake");
    assert_eq!(config.generation.destination_suffix, "fakes");
    assert!(config.provider.include_tests);
}

#[test]
fn test_config_validation_destination_suffix() {
    let mut config = FakeforgeConfig::default();
    config.generation.destination_suffix = "  ".to_string();
    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("destination_suffix"));
}

#[test]
fn test_batch_request_parses_from_toml() {
    let toml = r#"
        namespace_path = "example.com/app/storage"
        target_name = "Repo"
        destination_package = "storagefakes"

        [alias_overrides]
        "example.com/app/storage" = "store"
    "#;

    let request: GenerationRequest = toml::from_str(toml).expect("Failed to parse request");
    assert_eq!(request.mode, ResolveMode::Auto);
    assert_eq!(request.target_name.as_deref(), Some("Repo"));
    assert_eq!(
        request.alias_overrides.get("example.com/app/storage"),
        Some(&"store".to_string())
    );
    assert_eq!(request.label(), "example.com/app/storage.Repo");
}

#[test]
fn test_package_request_label() {
    let request = GenerationRequest::package("os");
    assert_eq!(request.mode, ResolveMode::Package);
    assert_eq!(request.label(), "os (package)");
}
