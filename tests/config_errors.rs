// tests/config_errors.rs

use std::fs;

use clusterside_test_utils::builders::{JobConfigBuilder, irods, local_file};
use clusterside_test_utils::init_tracing;

use clusterside::config::{load_and_validate, load_from_path};
use clusterside::errors::ClustersideError;
use clusterside::job::Run;
use clusterside::types::{InputKind, StorageKind};
use serde_json::json;

const API: &str = "http://localhost/jobs/api/";

fn config_message(err: ClustersideError) -> String {
    match err {
        ClustersideError::ConfigError(msg) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn loads_a_complete_job_config_from_disk() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job_config.json");
    fs::write(
        &path,
        json!({
            "api_version": 0.1,
            "job_pk": 2,
            "task_pk": 20,
            "auth_token": "abc",
            "server_url": "http://server/jobs/api/",
            "singularity_url": "shub://frederic-michaud/python3",
            "command": "python3 --version > $OUT",
            "parameters": [{"key": "OUT", "value": "version.txt"}],
            "input": irods("file", "/tempZone/home/rods/in.txt", false),
        })
        .to_string(),
    )
    .unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.job_pk, 2);
    assert_eq!(cfg.task_pk, Some(20));
    assert_eq!(cfg.image.as_deref(), Some("shub://frederic-michaud/python3"));
    assert_eq!(cfg.field("image").as_deref(), Some("shub://frederic-michaud/python3"));
    assert_eq!(cfg.field("api_version").as_deref(), Some("0.1"));

    let input = cfg.input.as_ref().unwrap();
    assert_eq!(input.kind, InputKind::File);
    assert_eq!(input.descriptor.storage, StorageKind::Irods);
    assert_eq!(input.descriptor.credentials.as_ref().unwrap().port, 1247);

    let run = Run::from_config(&cfg, API).unwrap();
    assert_eq!(run.identifier(), "2");
    assert_eq!(run.params()[0].value, "version.txt");
}

#[test]
fn unreadable_or_malformed_files_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ClustersideError::ConfigError(_)));

    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    let message = config_message(load_from_path(&path).unwrap_err());
    assert!(message.contains("broken.json"), "{message}");

    fs::write(&path, "[1, 2]").unwrap();
    assert!(matches!(
        load_from_path(&path).unwrap_err(),
        ClustersideError::ConfigError(_)
    ));
}

#[test]
fn run_requires_image_and_command() {
    let cfg = JobConfigBuilder::new(1).without("image").build();
    assert!(config_message(Run::from_config(&cfg, API).unwrap_err()).contains("image"));

    let cfg = JobConfigBuilder::new(1).without("command").build();
    assert!(config_message(Run::from_config(&cfg, API).unwrap_err()).contains("command"));
}

#[test]
fn auth_token_is_only_required_when_reporting() {
    let cfg = JobConfigBuilder::new(1).without("auth_token").build();
    assert!(config_message(Run::from_config(&cfg, API).unwrap_err()).contains("auth_token"));
    assert!(Run::from_config(&cfg, "").is_ok());
}

#[test]
fn command_references_must_be_declared() {
    let cfg = JobConfigBuilder::new(1)
        .command("cat ${DATA} > $OUT")
        .param("DATA", "in.txt")
        .build();
    assert!(config_message(Run::from_config(&cfg, API).unwrap_err()).contains("OUT"));

    let cfg = JobConfigBuilder::new(1).command("cat $INPUT").build();
    assert!(config_message(Run::from_config(&cfg, API).unwrap_err()).contains("INPUT"));

    let cfg = JobConfigBuilder::new(1)
        .command("for i in 1 2; do echo $i $1 $HOME; done; cat $INPUT")
        .input(local_file("/data/in.txt"))
        .build();
    assert!(Run::from_config(&cfg, API).is_ok());
}

#[test]
fn parameter_shapes_are_validated() {
    let err = JobConfigBuilder::new(1)
        .field("parameters", json!({"NESTED": {"a": 1}}))
        .try_build()
        .unwrap_err();
    assert!(config_message(err).contains("NESTED"));

    let err = JobConfigBuilder::new(1)
        .param("INPUT", "x")
        .try_build()
        .unwrap_err();
    assert!(config_message(err).contains("INPUT"));

    let cfg = JobConfigBuilder::new(1)
        .field("parameters", json!({"COUNT": 3, "DEBUG": true}))
        .build();
    let values: Vec<_> = cfg.parameters.iter().map(|p| p.value.as_str()).collect();
    assert_eq!(values, vec!["3", "true"]);
}

#[test]
fn bindings_are_validated() {
    let err = JobConfigBuilder::new(1)
        .input(json!({"kind": "file", "host": "irods", "path": "/z/f"}))
        .try_build()
        .unwrap_err();
    assert!(config_message(err).contains("user"));

    let err = JobConfigBuilder::new(1)
        .input(json!({"kind": "blob", "path": "/z/f"}))
        .try_build()
        .unwrap_err();
    assert!(matches!(err, ClustersideError::ConfigError(_)));

    let err = JobConfigBuilder::new(1)
        .input(json!({"kind": "file", "path": "/data/f", "local_path": "x"}))
        .try_build()
        .unwrap_err();
    assert!(config_message(err).contains("local_path"));
}
