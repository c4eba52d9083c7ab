use super::*;
use crate::core::errors::OrthoparkError;

fn expect_config_error<T: std::fmt::Debug>(result: Result<T>) -> OrthoparkError {
    result.expect_err("expected configuration failure")
}

#[test]
fn default_configs_validate_successfully() {
    OrthoparkConfig::default()
        .validate()
        .expect("orthopark default");
    AnalysisConfig::default()
        .validate()
        .expect("analysis default");
    ReportConfig::default().validate().expect("report default");
    OdmConfig::default().validate().expect("odm default");
}

#[test]
fn analysis_confidence_threshold_bounds() {
    let mut config = AnalysisConfig::default();
    config.confidence_threshold = 1.5;
    let err = expect_config_error(config.validate());
    assert!(matches!(
        err,
        OrthoparkError::Config { field: Some(ref f), .. } if f == "analysis.confidence_threshold"
    ));
}

#[test]
fn report_rejects_zero_tokens_and_wild_temperature() {
    let mut config = ReportConfig::default();
    config.max_tokens = 0;
    let err = expect_config_error(config.validate());
    assert!(format!("{err}").contains("max_tokens"));

    config.max_tokens = 100;
    config.temperature = 3.5;
    let err = expect_config_error(config.validate());
    assert!(format!("{err}").contains("temperature"));
}

#[test]
fn odm_rejects_blank_project_and_dashed_options() {
    let mut config = OdmConfig::default();
    config.project_name = "  ".into();
    let err = expect_config_error(config.validate());
    assert!(format!("{err}").contains("project_name"));

    let mut config = OdmConfig::default();
    config.options.insert("--dsm".into(), true.into());
    let err = expect_config_error(config.validate());
    assert!(format!("{err}").contains("leading"));
}

#[test]
fn odm_rejects_reserved_project_name_in_any_case() {
    for name in ["images", "Images", " IMAGES "] {
        let mut config = OdmConfig::default();
        config.project_name = name.into();
        let err = expect_config_error(config.validate());
        assert!(matches!(
            err,
            OrthoparkError::Config { field: Some(ref f), .. } if f == "odm.project_name"
        ));
        assert!(format!("{err}").contains("cannot be 'images'"));
    }

    let config: OrthoparkConfig =
        serde_yaml::from_str("odm:\n  project_name: Images\n").expect("yaml");
    assert!(config.validate().is_err());
}

#[test]
fn default_options_match_expected_flags() {
    let options = OdmConfig::default_options();
    assert_eq!(options.get("dsm"), Some(&OdmOptionValue::Bool(true)));
    assert_eq!(
        options.get("orthophoto-resolution"),
        Some(&OdmOptionValue::Float(5.0))
    );
    assert_eq!(
        options.get("fast-orthophoto"),
        Some(&OdmOptionValue::Bool(false))
    );
    match options.get("max-concurrency") {
        Some(OdmOptionValue::Int(n)) => assert!(*n >= 1),
        other => panic!("unexpected max-concurrency: {other:?}"),
    }
    let keys: Vec<_> = options.keys().cloned().collect();
    assert_eq!(keys.first().map(String::as_str), Some("dsm"));
}

#[test]
fn option_values_parse_from_yaml() {
    let yaml = r#"
odm:
  options:
    dsm: true
    orthophoto-resolution: 2.5
    max-concurrency: 4
    feature-quality: high
    resize-to: ~
"#;
    let config: OrthoparkConfig = serde_yaml::from_str(yaml).expect("parse");
    let options = &config.odm.options;
    assert_eq!(options.get("dsm"), Some(&OdmOptionValue::Bool(true)));
    assert_eq!(
        options.get("orthophoto-resolution"),
        Some(&OdmOptionValue::Float(2.5))
    );
    assert_eq!(options.get("max-concurrency"), Some(&OdmOptionValue::Int(4)));
    assert_eq!(
        options.get("feature-quality"),
        Some(&OdmOptionValue::Text("high".into()))
    );
    assert_eq!(options.get("resize-to"), Some(&OdmOptionValue::Null));
}

#[test]
fn partial_yaml_keeps_defaults() {
    let yaml = "analysis:\n  enabled: true\n";
    let config: OrthoparkConfig = serde_yaml::from_str(yaml).expect("parse");
    assert!(config.analysis.enabled);
    assert_eq!(config.analysis.confidence_threshold, 0.4);
    assert_eq!(config.odm.project_name, "odm_processing");
    assert_eq!(config.odm.run_method, RunMethod::Docker);
    assert_eq!(config.logging.level, "INFO");
}

#[test]
fn float_arguments_keep_fraction() {
    assert_eq!(OdmOptionValue::Float(5.0).as_arg().as_deref(), Some("5.0"));
    assert_eq!(OdmOptionValue::Float(2.75).as_arg().as_deref(), Some("2.75"));
    assert_eq!(OdmOptionValue::Int(7).as_arg().as_deref(), Some("7"));
    assert_eq!(OdmOptionValue::Bool(true).as_arg(), None);
    assert_eq!(OdmOptionValue::Null.as_arg(), None);
}

#[test]
fn yaml_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orthopark.yml");

    let mut config = OrthoparkConfig::default();
    config.odm.project_name = "site_a".into();
    config.report.enabled = true;
    config.to_yaml_file(&path).expect("write");

    let loaded = OrthoparkConfig::from_yaml_file(&path).expect("read");
    assert_eq!(loaded.odm.project_name, "site_a");
    assert!(loaded.report.enabled);
    assert_eq!(loaded.odm.options, config.odm.options);
}

#[test]
fn missing_yaml_file_is_io_error() {
    let err = OrthoparkConfig::from_yaml_file("/definitely/not/here.yml").unwrap_err();
    assert!(matches!(err, OrthoparkError::Io { .. }));
}

#[test]
fn paths_resolve_against_project_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = PathsConfig {
        project_root: dir.path().to_path_buf(),
        ..PathsConfig::default()
    };
    let resolved = config.resolve().expect("resolve");
    assert_eq!(resolved.project_root, dir.path());
    assert_eq!(
        resolved.input_image_dir,
        dir.path().join("data").join("input_images")
    );
    assert_eq!(resolved.output_dir, dir.path().join("data").join("output"));
    assert!(resolved.models_dir.is_absolute());
}

#[test]
fn absolute_entries_override_project_root() {
    let root = tempfile::tempdir().expect("root");
    let images = tempfile::tempdir().expect("images");
    let config = PathsConfig {
        project_root: root.path().to_path_buf(),
        input_image_dir: images.path().to_path_buf(),
        ..PathsConfig::default()
    };
    let resolved = config.resolve().expect("resolve");
    assert_eq!(resolved.input_image_dir, images.path());
}

#[test]
fn resolution_ignores_null() {
    let mut config = OdmConfig::default();
    assert_eq!(config.resolution(), Some(&OdmOptionValue::Float(5.0)));
    config
        .options
        .insert("orthophoto-resolution".into(), OdmOptionValue::Null);
    assert_eq!(config.resolution(), None);
}
