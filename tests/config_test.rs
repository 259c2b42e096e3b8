use std::sync::Mutex;

use uniq_queue::Error;
use uniq_queue::config::{CAPACITY_VAR, LOG_LEVEL_VAR, POLICY_VAR, QueueConfig};
use uniq_queue::merge::MergePolicy;
use uniq_queue::telemetry::TelemetryConfig;

// Tests in this file share process-wide environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    unsafe {
        std::env::remove_var(POLICY_VAR);
        std::env::remove_var(CAPACITY_VAR);
        std::env::remove_var(LOG_LEVEL_VAR);
    }
}

#[test]
fn config_from_env_uses_defaults_when_unset() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let config = QueueConfig::from_env().unwrap();
    assert_eq!(config, QueueConfig::default());
    assert_eq!(config.policy, MergePolicy::RetainNew);
    assert_eq!(config.log_level, "info");
}

#[test]
fn config_from_env_reads_all_fields() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    unsafe {
        std::env::set_var(POLICY_VAR, "retain-old");
        std::env::set_var(CAPACITY_VAR, "64");
        std::env::set_var(LOG_LEVEL_VAR, "debug");
    }

    let config = QueueConfig::from_env().unwrap();
    assert_eq!(config.policy, MergePolicy::RetainOld);
    assert_eq!(config.initial_capacity, 64);
    assert_eq!(config.log_level, "debug");

    clear_env();
}

#[test]
fn config_from_env_fails_on_bad_values() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    unsafe {
        std::env::set_var(POLICY_VAR, "keep-everything");
    }
    assert!(matches!(QueueConfig::from_env(), Err(Error::UnknownPolicy(_))));

    unsafe {
        std::env::remove_var(POLICY_VAR);
        std::env::set_var(CAPACITY_VAR, "-1");
    }
    assert!(matches!(QueueConfig::from_env(), Err(Error::Config(_))));

    clear_env();
}

#[test]
fn config_from_toml() {
    let config = QueueConfig::from_toml_str(
        r#"
        [queue]
        policy = "retain_old"
        initial_capacity = 16
        "#,
    )
    .unwrap();

    assert_eq!(config.policy, MergePolicy::RetainOld);
    assert_eq!(config.initial_capacity, 16);
    assert_eq!(config.log_level, "info");
}

#[test]
fn config_from_empty_toml_is_default() {
    assert_eq!(QueueConfig::from_toml_str("").unwrap(), QueueConfig::default());
}

#[test]
fn config_from_toml_rejects_unknown_policy_and_fields() {
    let bad_policy = QueueConfig::from_toml_str("[queue]\npolicy = \"retain_all\"\n");
    assert!(matches!(bad_policy, Err(Error::Config(_))));

    let bad_field = QueueConfig::from_toml_str("[queue]\ncapacity = 3\n");
    assert!(matches!(bad_field, Err(Error::Config(_))));
}

#[test]
fn config_load_reads_file() {
    let path = std::env::temp_dir().join(format!("uniq-queue-config-{}.toml", std::process::id()));
    std::fs::write(&path, "[queue]\npolicy = \"retain_new\"\ninitial_capacity = 2\n").unwrap();

    let config = QueueConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.initial_capacity, 2);

    assert!(matches!(QueueConfig::load(&path), Err(Error::Io(_))));
}

#[test]
fn config_builds_queue_with_policy() {
    let config = QueueConfig {
        policy: MergePolicy::RetainOld,
        ..QueueConfig::default()
    };

    let mut queue = config.build_queue::<&str, u32>();
    assert!(queue.push("k", 1));
    assert!(!queue.push("k", 2));
    assert_eq!(queue.pop(), Some(("k", 1)));
}

#[test]
fn config_from_dotenv_without_env_file_uses_defaults() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let config = QueueConfig::from_dotenv().unwrap();
    assert_eq!(config, QueueConfig::default());
}

#[test]
fn config_from_env_file_loads_variables() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let path = std::env::temp_dir().join(format!("uniq-queue-{}.env", std::process::id()));
    std::fs::write(
        &path,
        format!("{POLICY_VAR}=retain_old\n{CAPACITY_VAR}=12\n{LOG_LEVEL_VAR}=warn\n"),
    )
    .unwrap();

    let config = QueueConfig::from_env_file(&path);
    std::fs::remove_file(&path).unwrap();
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.policy, MergePolicy::RetainOld);
    assert_eq!(config.initial_capacity, 12);
    assert_eq!(config.log_level, "warn");
}

#[test]
fn config_from_missing_env_file_fails() {
    let path = std::env::temp_dir().join("uniq-queue-does-not-exist.env");
    assert!(matches!(QueueConfig::from_env_file(&path), Err(Error::Config(_))));
}

#[test]
fn config_log_level_reaches_telemetry_config() {
    let config = QueueConfig {
        log_level: "uniq_queue=trace".to_string(),
        ..QueueConfig::default()
    };

    let telemetry = TelemetryConfig::from(&config);
    assert_eq!(telemetry.log_level.as_deref(), Some("uniq_queue=trace"));
}
