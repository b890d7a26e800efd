use layergen::{check_artifacts, generate_from_paths, write_artifacts};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop")
}

#[test]
fn artifacts_are_written_below_target_directories() {
    let out = tempdir().unwrap();
    let artifacts = generate_from_paths(&[fixture()]).unwrap();
    let written = write_artifacts(&artifacts, out.path()).unwrap();
    assert_eq!(written, artifacts.len());

    let backend = fs::read_to_string(out.path().join("backend/Country.g.cs")).unwrap();
    assert!(backend.contains("namespace Shop.Server.Models"));
    let frontend = fs::read_to_string(out.path().join("frontend/Country.g.cs")).unwrap();
    assert!(frontend.contains("namespace Shop.Client.Models"));
}

#[test]
fn rerunning_a_pass_leaves_files_untouched() {
    let out = tempdir().unwrap();
    let artifacts = generate_from_paths(&[fixture()]).unwrap();
    write_artifacts(&artifacts, out.path()).unwrap();

    let again = generate_from_paths(&[fixture()]).unwrap();
    assert_eq!(write_artifacts(&again, out.path()).unwrap(), 0);
    assert!(check_artifacts(&again, out.path()).unwrap().is_empty());
}

#[test]
fn check_reports_stale_and_missing_files() {
    let out = tempdir().unwrap();
    let artifacts = generate_from_paths(&[fixture()]).unwrap();
    write_artifacts(&artifacts, out.path()).unwrap();

    let edited = out.path().join("backend/Country.g.cs");
    fs::write(&edited, "// hand edited\n").unwrap();
    let removed = out.path().join("frontend/IApplicationUserClient.g.cs");
    fs::remove_file(&removed).unwrap();

    let stale = check_artifacts(&artifacts, out.path()).unwrap();
    assert_eq!(stale.len(), 2);
    assert!(stale.contains(&edited));
    assert!(stale.contains(&removed));
}
