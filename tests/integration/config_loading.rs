//! Service clients built from a configuration file.

use composer::client::{NO_RESILIENCY, NO_RETRIES, SINGLE_RETRY};
use composer::provider::resilient_content_from;
use composer::{ComposerError, ConfigLoader};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_service_clients_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("composer.toml");
    std::fs::write(
        &config_file,
        r#"
default_client = "search"

[clients.search]
retries = 2
connect_timeout_ms = 200
read_timeout_ms = 750

[clients.legacy]
resilient = false

[circuit_breaker]
request_volume_threshold = 10
error_threshold_percentage = 25
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let clients = config.service_clients().unwrap();

    let default = clients.get_default().config();
    assert_eq!(default.name(), "search");
    assert_eq!(default.retries(), 2);
    assert_eq!(default.connect_timeout(), Duration::from_millis(200));
    assert_eq!(default.read_timeout(), Duration::from_millis(750));

    let mut names: Vec<&str> = clients.names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["legacy", NO_RESILIENCY, NO_RETRIES, "search", SINGLE_RETRY]);

    assert_eq!(clients.breakers().config().request_volume_threshold, 10);
    assert_eq!(clients.breakers().config().error_threshold_percentage, 25);

    let legacy = clients.get_by("legacy").unwrap();
    assert!(!legacy.config().is_resilient());
    let fallback = composer::provider::content_from(legacy, "/fallback", "text/plain");
    assert!(matches!(
        resilient_content_from(legacy, "/primary", "text/plain", fallback),
        Err(ComposerError::FallbackNotAllowed(name)) if name == "legacy"
    ));
}

#[test]
fn test_invalid_config_reports_every_problem() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("composer.toml");
    std::fs::write(
        &config_file,
        r#"
default_client = "unknown"

[clients.broken]
resilient = false
retries = 1

[logging]
output = "syslog"
"#,
    )
    .unwrap();

    match ConfigLoader::load_from_file(&config_file) {
        Err(ComposerError::Config(message)) => {
            assert!(message.contains("unknown"));
            assert!(message.contains("broken"));
            assert!(message.contains("syslog"));
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}
