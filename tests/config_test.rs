use meter_link::Config;
use pretty_assertions::assert_eq;
use serial_test::serial;

fn write_temp_config(tag: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "meter-link-config-{}-{}.yaml",
        tag,
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial]
fn test_full_config_loading() {
    let path = write_temp_config(
        "full",
        r#"
device:
  host: "10.0.0.50"
  port: 8080

rates:
  tier1: 12.5
  tier2: 18.0
  tier3: 25.0
  demand: 500.0

registry:
  path: "/var/lib/meter-link/devices.json"
"#,
    );

    std::env::remove_var("METER_HOST");
    let cfg = Config::load(&path).unwrap();

    assert_eq!(cfg.device.host, "10.0.0.50");
    assert_eq!(cfg.device.port, 8080);
    assert_eq!(cfg.rates.tier1, 12.5);
    assert_eq!(cfg.rates.tier2, 18.0);
    assert_eq!(cfg.rates.tier3, 25.0);
    assert_eq!(cfg.rates.demand, 500.0);
    assert_eq!(cfg.registry.path, "/var/lib/meter-link/devices.json");

    std::fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_partial_config_falls_back_to_defaults() {
    let path = write_temp_config(
        "partial",
        r#"
device:
  host: "10.0.0.50"
"#,
    );

    std::env::remove_var("METER_HOST");
    let cfg = Config::load(&path).unwrap();

    assert_eq!(cfg.device.host, "10.0.0.50");
    assert_eq!(cfg.device.port, 80);
    // Rate card defaults
    assert_eq!(cfg.rates.tier1, 32.0);
    assert_eq!(cfg.rates.tier2, 42.0);
    assert_eq!(cfg.rates.tier3, 50.0);
    assert_eq!(cfg.rates.demand, 1000.0);

    std::fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_env_override_for_host() {
    let path = write_temp_config(
        "env-override",
        r#"
device:
  host: "10.0.0.50"
"#,
    );

    let original = std::env::var("METER_HOST").ok();
    std::env::set_var("METER_HOST", "192.168.1.77");

    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.device.host, "192.168.1.77");

    if let Some(val) = original {
        std::env::set_var("METER_HOST", val);
    } else {
        std::env::remove_var("METER_HOST");
    }
    std::fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_placeholder_expansion_in_file() {
    let original = std::env::var("METER_HOST").ok();
    std::env::remove_var("METER_HOST");
    std::env::set_var("METER_LINK_TEST_HOST", "meter.lan");

    let path = write_temp_config(
        "placeholder",
        r#"
device:
  host: "$(METER_LINK_TEST_HOST)"
"#,
    );

    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.device.host, "meter.lan");

    std::env::remove_var("METER_LINK_TEST_HOST");
    if let Some(val) = original {
        std::env::set_var("METER_HOST", val);
    }
    std::fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_invalid_config_rejected() {
    std::env::remove_var("METER_HOST");

    let path = write_temp_config("bad-port", "device:\n  host: \"10.0.0.1\"\n  port: 0\n");
    assert!(Config::load(&path).is_err());
    std::fs::remove_file(path).ok();

    let path = write_temp_config("bad-rate", "rates:\n  tier1: -5.0\n");
    assert!(Config::load(&path).is_err());
    std::fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    std::env::remove_var("METER_HOST");
    let path = std::env::temp_dir().join(format!(
        "meter-link-config-nonexistent-{}.yaml",
        std::process::id()
    ));
    std::fs::remove_file(&path).ok();

    let cfg = Config::load_or_default(&path).unwrap();
    assert_eq!(cfg.device.host, "192.168.4.1");
    assert_eq!(cfg.device.port, 80);
}
