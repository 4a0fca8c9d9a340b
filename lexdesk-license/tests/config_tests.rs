use lexdesk_license::{LicenseConfig, LicenseError, MAX_TRIAL_DAYS};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn defaults() {
    let config = LicenseConfig::default();
    assert_eq!(config.app_name, "LexDesk");
    assert_eq!(config.state_file, "license.dat");
    assert_eq!(config.trial_days, 14);
    assert_eq!(config.poll_interval(), Duration::from_millis(500));
    assert!(config.validate().is_ok());
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = LicenseConfig::load_from(dir.path().join("license.toml"));
    assert_eq!(config, LicenseConfig::default());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("license.toml");
    std::fs::write(&path, "trial_days = 30\ndata_dir = \"/srv/lexdesk\"\n").unwrap();

    let config = LicenseConfig::load_from(&path);
    assert_eq!(config.trial_days, 30);
    assert_eq!(config.data_dir, Some(PathBuf::from("/srv/lexdesk")));
    assert_eq!(config.state_file, "license.dat");
    assert_eq!(config.poll_interval_ms, 500);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("license.toml");
    std::fs::write(&path, "trial_days = \"fourteen\"\n[[[").unwrap();
    assert_eq!(LicenseConfig::load_from(&path), LicenseConfig::default());
}

#[test]
fn validate_rejects_zero_trial() {
    let config = LicenseConfig {
        trial_days: 0,
        ..LicenseConfig::default()
    };
    assert!(matches!(config.validate(), Err(LicenseError::Config(_))));
}

#[test]
fn validate_bounds_trial_length() {
    let longest = LicenseConfig {
        trial_days: MAX_TRIAL_DAYS,
        ..LicenseConfig::default()
    };
    assert!(longest.validate().is_ok());

    for trial_days in [MAX_TRIAL_DAYS + 1, u32::MAX] {
        let config = LicenseConfig {
            trial_days,
            ..LicenseConfig::default()
        };
        assert!(matches!(config.validate(), Err(LicenseError::Config(_))));
    }
}

#[test]
fn validate_rejects_zero_interval() {
    let config = LicenseConfig {
        poll_interval_ms: 0,
        ..LicenseConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_blank_state_file() {
    let config = LicenseConfig {
        state_file: "  ".into(),
        ..LicenseConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn data_dir_override_wins() {
    let config = LicenseConfig {
        data_dir: Some(PathBuf::from("/tmp/lexdesk-test")),
        ..LicenseConfig::default()
    };
    assert_eq!(
        config.state_path().unwrap(),
        PathBuf::from("/tmp/lexdesk-test/license.dat")
    );
}

#[test]
fn default_data_dir_is_per_application() {
    let config = LicenseConfig::default();
    if let Ok(dir) = config.resolve_data_dir() {
        assert!(dir.ends_with("LexDesk"));
    }
}
