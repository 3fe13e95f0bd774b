use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Runs fwumd inside `dir`, with its config read from there too.
fn fwumd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fwumd").unwrap();
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("FWUMD_LOG")
        .arg("--config")
        .arg(dir);
    cmd
}

fn dummy_pair(dir: &TempDir, json: &str, bin: &str, dims: (usize, usize)) {
    fwumd(dir.path())
        .args(["--nb-fw-imgs", &dims.0.to_string()])
        .args(["--nb-banks", &dims.1.to_string()])
        .args(["dummy", "-j", json, "-b", bin])
        .assert()
        .success();
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn dummy_writes_default_pair() {
    let dir = tempfile::tempdir().unwrap();
    fwumd(dir.path())
        .arg("dummy")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 images x 2 banks"));

    assert_eq!(fs::metadata(dir.path().join("dummy.bin")).unwrap().len(), 24 + 2 * 8);
    let json = read_json(&dir.path().join("dummy.json"));
    assert_eq!(json["configs"]["nb_fw_img"], 1);
    assert_eq!(json["configs"]["nb_fw_banks"], 2);
    assert_eq!(json["metadata"]["active_index"], 1);
    assert!(json["metadata"]["img_entry"]["img_0"]["img_bank_info"]["img_0_bank_1"].is_object());
}

#[test]
fn dummy_display_dumps_the_binary() {
    let dir = tempfile::tempdir().unwrap();
    fwumd(dir.path())
        .args(["dummy", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nb_fw_banks"))
        .stdout(predicate::str::contains("img[0].bank[1].accepted"));
}

#[test]
fn legacy_dimension_flags_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    fwumd(dir.path())
        .args(["-ni", "3", "-nb=4", "dummy"])
        .assert()
        .success();
    assert_eq!(fs::metadata(dir.path().join("dummy.bin")).unwrap().len(), 24 + 12 * 8);
}

#[test]
fn config_supplies_default_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.json"),
        r#"{ "nb_fw_img": 2, "nb_fw_banks": 3 }"#,
    )
    .unwrap();
    fwumd(dir.path()).arg("dummy").assert().success();
    let json = read_json(&dir.path().join("dummy.json"));
    assert_eq!(json["configs"]["nb_fw_img"], 2);
    assert_eq!(json["configs"]["nb_fw_banks"], 3);
}

#[test]
fn jsonparse_reproduces_the_binary() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (2, 2));
    fwumd(dir.path())
        .args(["jsonparse", "d.json", "-b", "again.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("again.bin"));
    assert_eq!(
        fs::read(dir.path().join("d.bin")).unwrap(),
        fs::read(dir.path().join("again.bin")).unwrap()
    );
}

#[test]
fn jsonparse_rejects_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (1, 2));
    let mut json = read_json(&dir.path().join("d.json"));
    json["metadata"]["active_index"] = serde_json::json!(5);
    fs::write(dir.path().join("d.json"), json.to_string()).unwrap();

    fwumd(dir.path())
        .args(["jsonparse", "d.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("active_index"));
    assert!(!dir.path().join("fwupd.bin").exists());
}

#[test]
fn binparse_with_template_restores_names() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (2, 3));
    fwumd(dir.path())
        .args(["binparse", "d.bin", "-j", "back.json", "-t", "d.json"])
        .assert()
        .success();
    assert_eq!(
        read_json(&dir.path().join("d.json")),
        read_json(&dir.path().join("back.json"))
    );
}

#[test]
fn binparse_without_template_synthesizes_names() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (1, 2));
    fwumd(dir.path())
        .args(["binparse", "d.bin"])
        .assert()
        .success();
    let json = read_json(&dir.path().join("fwupd.json"));
    assert!(json["metadata"]["img_entry"]["img_0"].is_object());
    assert!(json["uuids"]["entries"]["img_0_bank_1"].is_string());
}

#[test]
fn dump_lists_every_word() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (1, 2));
    fwumd(dir.path())
        .args(["dump", "d.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crc_32"))
        .stdout(predicate::str::contains("previous_active_index"))
        .stdout(predicate::str::contains("img[0].bank[1].reserved"))
        .stdout(predicate::str::contains("(accepted)"));
}

#[test]
fn dump_rejects_truncated_binary() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (1, 2));
    let bytes = fs::read(dir.path().join("d.bin")).unwrap();
    fs::write(dir.path().join("d.bin"), &bytes[..bytes.len() - 4]).unwrap();
    fwumd(dir.path())
        .args(["dump", "d.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Layout mismatch"));
}

#[test]
fn verify_checksum_catches_corruption() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (1, 2));
    let mut bytes = fs::read(dir.path().join("d.bin")).unwrap();
    bytes[28] ^= 0x01;
    fs::write(dir.path().join("d.bin"), &bytes).unwrap();

    fwumd(dir.path()).args(["dump", "d.bin"]).assert().success();
    fwumd(dir.path())
        .args(["--verify-checksum", "dump", "d.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Checksum mismatch"));
}

#[test]
fn shell_edits_pair_in_place() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (2, 2));
    fwumd(dir.path())
        .args(["shell", "-j", "d.json", "-b", "d.bin"])
        .args(["set_bank_policy", "img_1", "1", "refuse,", "print_choices_uuids"])
        .assert()
        .success()
        .stdout(predicate::str::contains("This setup will not be booted"));

    let json = read_json(&dir.path().join("d.json"));
    assert_eq!(
        json["metadata"]["img_entry"]["img_1"]["img_bank_info"]["img_1_bank_1"]["accepted"],
        false
    );
    fwumd(dir.path())
        .args(["jsonparse", "d.json", "-b", "check.bin"])
        .assert()
        .success();
    assert_eq!(
        fs::read(dir.path().join("d.bin")).unwrap(),
        fs::read(dir.path().join("check.bin")).unwrap()
    );
}

#[test]
fn shell_runs_script_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("build.fwu"),
        "# build a record from scratch\n\
         autodummy 3 2\n\
         set_active_index 0, set_previous_active_index 1\n\
         save pair s.json s.bin\n",
    )
    .unwrap();
    fwumd(dir.path())
        .args(["shell", "-s", "build.fwu", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ autodummy 3 2"))
        .stdout(predicate::str::contains("Saved"));

    let json = read_json(&dir.path().join("s.json"));
    assert_eq!(json["configs"]["nb_fw_img"], 3);
    assert_eq!(json["metadata"]["active_index"], 0);
    assert_eq!(json["metadata"]["previous_active_index"], 1);
    assert_eq!(fs::metadata(dir.path().join("s.bin")).unwrap().len(), 24 + 6 * 8);
}

#[test]
fn shell_refuses_interactive_commands_in_scripts() {
    let dir = tempfile::tempdir().unwrap();
    fwumd(dir.path())
        .args(["shell", "create_metadata"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only available in interactive mode"));
}

#[test]
fn failing_script_leaves_files_untouched() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (1, 2));
    let before = fs::read(dir.path().join("d.json")).unwrap();
    fwumd(dir.path())
        .args(["shell", "-j", "d.json", "-b", "d.bin"])
        .args(["set_active_index", "0,", "set_bank_policy", "img_9", "0", "refuse"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("command 2/2"));
    assert_eq!(before, fs::read(dir.path().join("d.json")).unwrap());
}

#[test]
fn shell_rejects_mismatched_pair() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "a.json", "a.bin", (1, 2));
    dummy_pair(&dir, "b.json", "b.bin", (2, 2));
    fwumd(dir.path())
        .args(["shell", "-j", "a.json", "-b", "b.bin", "exit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("differ"));
}

#[test]
fn shell_reads_commands_from_piped_stdin() {
    let dir = tempfile::tempdir().unwrap();
    fwumd(dir.path())
        .arg("shell")
        .write_stdin("autodummy 1 2\nprint_all_uuids\nbogus\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Image banks ---"))
        .stdout(predicate::str::contains("img_0_bank_1"))
        .stderr(predicate::str::contains("Unknown command: bogus"));
}

#[test]
fn oversized_dimensions_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    fwumd(dir.path())
        .args(["--nb-banks", "5000000000", "dummy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("32-bit record"));
    assert!(!dir.path().join("dummy.json").exists());

    fwumd(dir.path())
        .args(["shell", "autodummy", "536870909", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("32-bit record"));
}

#[test]
fn binparse_rejects_active_index_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    dummy_pair(&dir, "d.json", "d.bin", (1, 2));
    let mut bytes = fs::read(dir.path().join("d.bin")).unwrap();
    bytes[8..12].copy_from_slice(&7u32.to_le_bytes());
    fs::write(dir.path().join("d.bin"), &bytes).unwrap();

    fwumd(dir.path())
        .args(["binparse", "d.bin", "-j", "out.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("active_index 7 is outside"));
    assert!(!dir.path().join("out.json").exists());
}
