use assert_cmd::Command;
use morf_test_data::TestDataSet;
use std::fs;

#[test]
fn test_cli_train_then_predict() {
    let data = TestDataSet::linkers_01();
    let (root, _tmp) = data.create_temp().unwrap();
    let weights = root.join("weights.safetensors");
    let report = root.join("report.json");

    let mut cmd = Command::cargo_bin("morf").unwrap();
    cmd.arg("--cpu")
        .arg("--data-dir")
        .arg(&root)
        .arg("train")
        .arg("--steps")
        .arg("5")
        .arg("--output")
        .arg(&weights)
        .arg("--report")
        .arg(&report);
    cmd.assert().success();
    assert!(weights.is_file());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["steps"], 5);
    assert_eq!(report["linkers"].as_array().unwrap().len(), 4);
    assert_eq!(report["losses"].as_array().unwrap().len(), 5);

    let output = Command::cargo_bin("morf")
        .unwrap()
        .arg("--cpu")
        .arg("--data-dir")
        .arg(&root)
        .arg("predict")
        .arg("0001")
        .arg("0002")
        .arg("--weights")
        .arg(&weights)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("0001 "));
    assert!(lines[1].starts_with("0002 "));
    let value: f32 = lines[0].split_whitespace().nth(1).unwrap().parse().unwrap();
    assert!(value.is_finite());
}

#[test]
fn test_cli_predict_possible() {
    let (root, _tmp) = TestDataSet::linkers_01().create_temp().unwrap();
    let mut cmd = Command::cargo_bin("morf").unwrap();
    cmd.arg("--cpu")
        .arg("--data-dir")
        .arg(&root)
        .arg("predict")
        .arg("--possible")
        .arg("0004");
    cmd.assert().success();
}

#[test]
fn test_cli_predict_missing_linker_fails() {
    let (root, _tmp) = TestDataSet::linkers_01().create_temp().unwrap();
    let mut cmd = Command::cargo_bin("morf").unwrap();
    cmd.arg("--cpu")
        .arg("--data-dir")
        .arg(&root)
        .arg("predict")
        .arg("9999");
    cmd.assert().failure();
}

#[test]
fn test_cli_train_without_properties_fails() {
    let (root, _tmp) = TestDataSet::unlabelled_01().create_temp().unwrap();
    let mut cmd = Command::cargo_bin("morf").unwrap();
    cmd.arg("--cpu")
        .arg("--data-dir")
        .arg(&root)
        .arg("train")
        .arg("--output")
        .arg(root.join("w.safetensors"));
    cmd.assert().failure();
}

#[test]
fn test_cli_rejects_unknown_feature() {
    let (root, _tmp) = TestDataSet::linkers_01().create_temp().unwrap();
    let config = root.join("morf.toml");
    fs::write(&config, "[learner]\nfeature = \"graph\"\n").unwrap();

    let mut cmd = Command::cargo_bin("morf").unwrap();
    cmd.arg("--cpu")
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(&root)
        .arg("predict")
        .arg("0001");
    cmd.assert().failure();
}

#[cfg(unix)]
#[test]
fn test_cli_compute_property() {
    let temp = tempfile::tempdir().unwrap();
    let run_dir = temp.path().join("run");
    let learn_dir = temp.path().join("learn");
    fs::create_dir_all(learn_dir.join("computation")).unwrap();
    fs::write(learn_dir.join("computation/calcStiff.py"), "tail -n 1 \"$1\"\n").unwrap();
    let output = run_dir.join("data/linker5_deformation/linker5-ave-force.d");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    fs::write(&output, "step force\n200 4.75\n").unwrap();

    let config = temp.path().join("morf.toml");
    fs::write(
        &config,
        format!(
            "[learner]\ndata-dir = {:?}\n\n[search]\nlearn-dir = {:?}\npython = \"sh\"\n",
            run_dir.display().to_string(),
            learn_dir.display().to_string()
        ),
    )
    .unwrap();

    let result = Command::cargo_bin("morf")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("compute")
        .arg("property")
        .arg("5")
        .output()
        .unwrap();
    assert!(result.status.success());
    assert_eq!(String::from_utf8(result.stdout).unwrap().trim(), "5 200 4.75");
}

#[cfg(unix)]
#[test]
fn test_cli_compute_feature_with_relative_dirs() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp.path().join("learn/computation")).unwrap();
    fs::write(
        temp.path().join("learn/computation/calcPoint.py"),
        "name=$(basename \"$1\" .lmpdat)\ncp \"$1\" \"$2/${name#linker}.npy\"\n",
    )
    .unwrap();
    fs::create_dir_all(temp.path().join("run/data")).unwrap();
    fs::write(temp.path().join("run/data/linker12.lmpdat"), "atoms").unwrap();
    fs::write(
        temp.path().join("morf.toml"),
        "[search]\nlearn-dir = \"learn\"\npython = \"sh\"\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("morf").unwrap();
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg("morf.toml")
        .arg("--data-dir")
        .arg("run")
        .arg("compute")
        .arg("feature")
        .arg("12");
    cmd.assert().success();
    assert_eq!(
        fs::read_to_string(temp.path().join("run/feature/point/12.npy")).unwrap(),
        "atoms"
    );
}
