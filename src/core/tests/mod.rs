use std::fs;

use serde_json::json;
use tempfile::TempDir;

use crate::core::{self, ConfigMap, QadapterError, QueueAdapter, QueueType};

#[test]
fn save_and_load_adapter() {
  let temp_dir = TempDir::new().unwrap();
  let path = temp_dir.path().join("pbs.json");
  let options: ConfigMap = json!({"queue": "batch", "walltime": "12:00:00"})
    .as_object()
    .cloned()
    .unwrap();
  let adapter = QueueAdapter::create("PBS", Some("cluster"), None, options).unwrap();

  core::save_adapter(&adapter, &path).unwrap();
  let loaded = core::load_adapter(&path).unwrap();
  assert_eq!(loaded, adapter);
  assert_eq!(loaded.queue_type(), QueueType::Pbs);
}

#[test]
fn load_adapter_from_yaml() {
  let temp_dir = TempDir::new().unwrap();
  let path = temp_dir.path().join("sge.yaml");
  fs::write(&path, "_fw_name: CommonAdapter\n_fw_q_type: SGE\nqueue: all.q\n").unwrap();

  let adapter = core::resolve_adapter(Some(&path)).unwrap();
  assert_eq!(adapter.queue_type(), QueueType::Sge);
  assert_eq!(adapter.queue_filter(), Some("all.q".to_string()));
}

#[test]
fn load_adapter_with_unsupported_type() {
  let temp_dir = TempDir::new().unwrap();
  let path = temp_dir.path().join("lsf.yaml");
  fs::write(&path, "_fw_q_type: LSF\n").unwrap();

  assert!(matches!(
    core::load_adapter(&path),
    Err(QadapterError::AdapterError(_))
  ));
}

#[test]
fn init_logging_twice() {
  core::init_logging();
  core::init_logging();
}
