use std::{fs, path::Path, process::Command};

fn region_wcloud() -> Command {
    Command::new(env!("CARGO_BIN_EXE_region-wcloud"))
}

fn write_config(root: &Path, extra: &str) -> std::path::PathBuf {
    let config = format!(
        "[input]\n\
         documents_dir = '{docs}'\n\
         masks_dir = '{masks}'\n\
         output_dir = '{out}'\n\
         stop_words = '{stop}'\n\
         {extra}\n",
        docs = root.join("docs").display(),
        masks = root.join("masks").display(),
        out = root.join("out").display(),
        stop = root.join("stop.txt").display(),
    );
    let path = root.join("region-wcloud.toml");
    fs::write(&path, config).expect("failed to write config");
    path
}

#[test]
fn init_config_writes_a_loadable_file() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("region-wcloud.toml");

    let output = region_wcloud()
        .args(["--config", path.to_str().unwrap(), "init-config"])
        .output()
        .expect("failed to run init-config");
    assert!(output.status.success());

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[aggregation]"));
    assert!(region_wcloud_lib_parses(&content));

    let again = region_wcloud()
        .args(["--config", path.to_str().unwrap(), "init-config"])
        .output()
        .expect("failed to run init-config");
    assert!(!again.status.success(), "existing file must not be overwritten");
}

fn region_wcloud_lib_parses(content: &str) -> bool {
    region_wcloud::Config::parse(content).is_ok()
}

#[test]
fn missing_documents_folder_is_not_an_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = write_config(dir.path(), "");

    let output = region_wcloud()
        .args(["--config", config.to_str().unwrap(), "cloud", "--no-cloud"])
        .output()
        .expect("failed to run cloud");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).is_empty());
}

#[test]
fn reports_frequencies_without_rendering() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(
        dir.path().join("docs/黄浦区.txt"),
        "上海上海黄浦区黄浦区黄浦区的的\n外滩外滩\n",
    )
    .unwrap();
    fs::write(dir.path().join("stop.txt"), "的\n").unwrap();
    let config = write_config(dir.path(), "use_masks = false");

    let output = region_wcloud()
        .args(["--config", config.to_str().unwrap(), "cloud", "--no-cloud"])
        .output()
        .expect("failed to run cloud");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.starts_with("黄浦区 ("), "unexpected report: {stdout}");
    assert!(stdout.contains("Top1"), "unexpected report: {stdout}");
    assert!(!stdout.contains(" 的 "), "stop word leaked: {stdout}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn missing_font_fails_the_run() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = write_config(
        dir.path(),
        &format!("\n[cloud]\nfont = '{}'", dir.path().join("none.ttf").display()),
    );

    let output = region_wcloud()
        .args(["--config", config.to_str().unwrap(), "cloud"])
        .output()
        .expect("failed to run cloud");

    assert!(!output.status.success());
}
