//! Configuration and Bootstrap Tests
//!
//! # Running Tests
//! ```bash
//! cargo test --test config_tests
//! ```

use std::fs;

use r6bind_engine::{
    BindingConfig, ClassMapPolicy, ConfigError, ProxyClass, R6Binding, VersionStatus,
};
use r6bind_test_helpers::{fixtures, MockRuntime};
use tempfile::tempdir;

#[test]
fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("r6bind.toml");
    fs::write(
        &path,
        r#"
package = "R6"
target_version = "2.5."
policy = "static"
"#,
    )
    .unwrap();

    let config = BindingConfig::load(&path).unwrap();
    assert_eq!(config.policy, ClassMapPolicy::Static);
    assert_eq!(config.target_version, "2.5.");
    assert!(config.check_version);
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let err = BindingConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("r6bind.toml");
    fs::write(&path, "policy = [").unwrap();

    let err = BindingConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_loaded_policy_drives_binding() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("r6bind.toml");
    fs::write(&path, "policy = \"static\"\ncheck_version = false\n").unwrap();
    let config = BindingConfig::load(&path).unwrap();

    let runtime = MockRuntime::new();
    let generator = runtime.define_generator(fixtures::stack_generator());
    let binding = R6Binding::with_config(runtime.clone(), config).unwrap();

    let proxy = binding.wrap_class_generator(generator).unwrap();
    assert!(ProxyClass::same(proxy.user_class(), binding.root_class()));
    assert_eq!(binding.version_status(), &VersionStatus::Skipped);
}

// ===== Bootstrap =====

#[test]
fn test_bootstrap_compatible_version() {
    let runtime = MockRuntime::new();
    runtime.set_package_version("R6", "2.4.1");

    let binding = R6Binding::new(runtime).unwrap();
    assert!(binding.version_status().is_compatible());
}

#[test]
fn test_bootstrap_mismatch_still_binds() {
    let runtime = MockRuntime::new();
    runtime.set_package_version("R6", "2.5.1");
    let generator = runtime.define_generator(fixtures::stack_generator());

    let binding = R6Binding::new(runtime.clone()).unwrap();
    assert_eq!(
        binding.version_status(),
        &VersionStatus::Mismatch {
            expected: "2.4.".to_string(),
            found: "2.5.1".to_string(),
        }
    );
    assert!(binding.wrap_class_generator(generator).is_ok());
}

#[test]
fn test_bootstrap_checks_configured_package() {
    let runtime = MockRuntime::new();
    runtime.set_package_version("R6", "2.4.1");
    runtime.set_package_version("R6Ext", "1.0.0");
    let config = BindingConfig::from_toml_str("package = \"R6Ext\"\ntarget_version = \"1.\"").unwrap();

    let binding = R6Binding::with_config(runtime, config).unwrap();
    assert_eq!(
        binding.version_status(),
        &VersionStatus::Compatible {
            found: "1.0.0".to_string()
        }
    );
}
