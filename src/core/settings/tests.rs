use std::path::PathBuf;

use crate::core::settings::*;

pub fn init_settings_for_tests() -> tempfile::TempDir {
  let temp_dir = tempfile::tempdir().unwrap();
  assert!(set_settings_local(temp_dir.path(), &QadapterSettings::default()).is_ok());
  temp_dir
}

#[test]
fn settings_init_test() {
  let temp_dir = init_settings_for_tests();
  assert!(temp_dir.path().join(LOCAL_SETTINGS_FILE).exists());
  assert_eq!(
    get_settings_local(temp_dir.path()).unwrap(),
    QadapterSettings::default()
  );
}

#[test]
fn set_and_get_default_adapter_local() {
  let temp_dir = init_settings_for_tests();
  let settings = QadapterSettings {
    default_adapter: Some(PathBuf::from("/etc/qadapter/pbs.yaml")),
  };
  assert!(set_settings_local(temp_dir.path(), &settings).is_ok());
  assert_eq!(
    get_settings_local(temp_dir.path())
      .expect("No settings file found")
      .default_adapter
      .expect("No default adapter found"),
    PathBuf::from("/etc/qadapter/pbs.yaml")
  );
}

#[test]
fn get_settings_local_missing() {
  let temp_dir = tempfile::tempdir().unwrap();
  assert!(matches!(
    get_settings_local(temp_dir.path()),
    Err(SettingsError::SettingsNotFound(_))
  ));
}

#[test]
fn find_local_settings_in_parent() {
  let temp_dir = init_settings_for_tests();
  let nested = temp_dir.path().join("a/b/c");
  std::fs::create_dir_all(&nested).unwrap();
  assert_eq!(
    find_local_settings_dir(&nested),
    Some(temp_dir.path().to_path_buf())
  );
}
