mod support;

use handsign::app_dirs::{self, APP_DIR_NAME};
use handsign::config::{self, TrainerSettings};
use support::handsign_env::HandsignEnvGuard;

#[test]
fn config_home_override_anchors_all_dirs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let _env = HandsignEnvGuard::set_config_home(temp.path().to_path_buf());

    let root = app_dirs::app_root_dir().expect("root");
    assert_eq!(root, temp.path().join(APP_DIR_NAME));
    assert!(app_dirs::logs_dir().unwrap().starts_with(&root));
    assert!(app_dirs::exports_dir().unwrap().is_dir());
    assert_eq!(config::config_path().unwrap(), root.join("config.toml"));
}

#[test]
fn settings_saved_under_override_are_reloaded() {
    let temp = tempfile::tempdir().expect("tempdir");
    let _env = HandsignEnvGuard::set_config_home(temp.path().to_path_buf());

    assert_eq!(config::load_or_default().unwrap(), TrainerSettings::default());
    let settings = TrainerSettings {
        epochs: 20,
        model_name: "letters".into(),
        ..TrainerSettings::default()
    };
    config::save(&settings).expect("save");
    assert_eq!(config::load_or_default().unwrap(), settings);

    let exports = settings.resolve_export_dir().unwrap();
    assert_eq!(exports, temp.path().join(APP_DIR_NAME).join("exports"));
}
