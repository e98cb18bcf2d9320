use super::*;
use figment::Jail;
use tempfile::tempdir;

fn valid_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = "test secret".to_string();
    settings
}

#[test]
fn test_settings_validation() {
    let settings = valid_settings();
    assert!(settings.validate().is_ok());

    // default has no secret
    assert!(Settings::default().validate().is_err());

    let mut invalid = settings.clone();
    invalid.log_level = "loud".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.auth.token_ttl_days = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.password_requirements.min_length = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.hash_workers = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.hashing.salt_length = 2;
    assert!(invalid.validate().is_err());
}

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:8080");
    assert_eq!(settings.auth.token_ttl_days, 90);
    assert_eq!(settings.hashing.memory_kib, 64 * 1024);
    assert_eq!(settings.hashing.iterations, 3);
    assert_eq!(settings.password_requirements.min_length, 5);
    assert_eq!(settings.log_format, LogFormat::Pretty);
    assert!(settings.hash_workers >= 1);
}

#[test]
fn test_secret_is_not_printed() {
    let settings = valid_settings();
    let printed = format!("{settings:?}");
    assert!(!printed.contains("test secret"));
    assert!(printed.contains("<redacted>"));
}

#[test]
fn test_load_settings_from_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        r#"
        bind_addr = "0.0.0.0:9000"
        log_format = "json"

        [auth]
        jwt_secret = "from file"
        token_ttl_days = 7

        [hashing]
        iterations = 4
        "#,
    )
    .unwrap();

    Jail::expect_with(|_| {
        let settings = Settings::load_from(&config_path).expect("settings should load");
        assert_eq!(settings.bind_addr.to_string(), "0.0.0.0:9000");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.auth.jwt_secret, "from file");
        assert_eq!(settings.auth.token_ttl_days, 7);
        assert_eq!(settings.hashing.iterations, 4);
        // untouched keys keep their defaults
        assert_eq!(settings.hashing.memory_kib, 64 * 1024);
        assert_eq!(settings.log_level, "info");
        Ok(())
    });
}

#[test]
fn test_environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            log_level = "debug"
            [auth]
            jwt_secret = "from file"
            "#,
        )?;
        jail.set_env("USERSVC_LOG_LEVEL", "warn");
        jail.set_env("USERSVC_AUTH__JWT_SECRET", "from env");
        jail.set_env("USERSVC_PASSWORD_REQUIREMENTS__MIN_LENGTH", "8");
        jail.set_env("USERSVC_HASH_WORKERS", "3");

        let settings = Settings::load().expect("settings should load");
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.auth.jwt_secret, "from env");
        assert_eq!(settings.password_requirements.min_length, 8);
        assert_eq!(settings.hash_workers, 3);
        Ok(())
    });
}

#[test]
fn test_missing_secret_fails_to_load() {
    Jail::expect_with(|_| {
        assert!(Settings::load().is_err());
        Ok(())
    });
}
