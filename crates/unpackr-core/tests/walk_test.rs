//! Integration tests for recursive tree unpacking

use std::fs;
use std::sync::Arc;
use unpackr_core::{
    unpack_tree, ArchiveFormat, RecordingObserver, WalkEvent, WalkOptions, Walker,
};
use unpackr_testing::assertions::{assert_absent, assert_tree, relative_files};
use unpackr_testing::fixtures::{
    corrupt_bytes, tar_bz2_bytes, tar_gz_bytes, write_7z, write_tar, write_tar_bz2, write_tar_gz,
    write_zip, zip_bytes,
};
use unpackr_testing::TestDir;

#[test]
fn test_zip_extracted_next_to_archive() {
    let test_dir = TestDir::new().unwrap();
    write_zip(&test_dir.join("a.zip"), &[("x.txt", b"hello")]).unwrap();

    let report = unpack_tree(test_dir.path(), false).unwrap();

    assert_eq!(report.archives_found, 1);
    assert_eq!(report.extracted, vec![test_dir.join("a")]);
    assert_tree(&test_dir.join("a"), &[("x.txt", b"hello")]).unwrap();
    assert!(test_dir.join("a.zip").exists());
}

#[test]
fn test_zip_deleted_after_extraction() {
    let test_dir = TestDir::new().unwrap();
    write_zip(&test_dir.join("a.zip"), &[("x.txt", b"hello")]).unwrap();

    let report = unpack_tree(test_dir.path(), true).unwrap();

    assert_eq!(report.deleted, 1);
    assert_absent(test_dir.path(), "a.zip");
    assert_tree(&test_dir.join("a"), &[("x.txt", b"hello")]).unwrap();
}

#[test]
fn test_every_format_is_unpacked() {
    let test_dir = TestDir::new().unwrap();
    write_7z(&test_dir.join("one.7z"), &[("one.txt", b"1")]).unwrap();
    write_zip(&test_dir.join("two.zip"), &[("two.txt", b"2")]).unwrap();
    write_tar_gz(&test_dir.join("three.tar.gz"), &[("three.txt", b"3")]).unwrap();
    write_tar_bz2(&test_dir.join("four.tar.bz2"), &[("four.txt", b"4")]).unwrap();
    write_tar(&test_dir.join("five.tar"), &[("five.txt", b"5")]).unwrap();

    let report = unpack_tree(test_dir.path(), true).unwrap();

    assert_eq!(report.archives_found, 5);
    assert!(report.is_clean());
    assert_eq!(
        relative_files(test_dir.path()).unwrap(),
        vec![
            "five/five.txt",
            "four/four.txt",
            "one/one.txt",
            "three/three.txt",
            "two/two.txt",
        ]
    );
}

#[test]
fn test_second_walk_gets_suffixed_folder() {
    let test_dir = TestDir::new().unwrap();
    write_zip(&test_dir.join("a.zip"), &[("x.txt", b"hello")]).unwrap();

    unpack_tree(test_dir.path(), false).unwrap();
    let report = Walker::new(WalkOptions {
        recursive: false,
        ..WalkOptions::default()
    })
    .unpack_tree(test_dir.path())
    .unwrap();

    assert_eq!(report.extracted, vec![test_dir.join("a_1")]);
    assert_tree(&test_dir.join("a"), &[("x.txt", b"hello")]).unwrap();
    assert_tree(&test_dir.join("a_1"), &[("x.txt", b"hello")]).unwrap();
}

#[test]
fn test_nested_archive_is_unpacked_in_place() {
    let test_dir = TestDir::new().unwrap();
    let inner = zip_bytes(&[("deep.txt", b"deep")]).unwrap();
    write_tar_gz(&test_dir.join("b.tar.gz"), &[("c.zip", &inner)]).unwrap();

    let report = unpack_tree(test_dir.path(), true).unwrap();

    assert_eq!(report.archives_found, 2);
    assert_eq!(report.deleted, 2);
    assert_eq!(
        relative_files(test_dir.path()).unwrap(),
        vec!["b/c/deep.txt"]
    );
}

#[test]
fn test_suffixed_target_is_recursed_into() {
    let test_dir = TestDir::new().unwrap();
    test_dir.create_dir("b").unwrap();
    let inner = zip_bytes(&[("deep.txt", b"deep")]).unwrap();
    write_zip(&test_dir.join("b.zip"), &[("c.zip", &inner)]).unwrap();

    let report = unpack_tree(test_dir.path(), false).unwrap();

    assert!(report.extracted.contains(&test_dir.join("b_1")));
    assert!(report.extracted.contains(&test_dir.join("b_1/c")));
    assert_eq!(fs::read(test_dir.join("b_1/c/deep.txt")).unwrap(), b"deep");
}

#[test]
fn test_extension_is_not_trusted() {
    let test_dir = TestDir::new().unwrap();
    let zip = zip_bytes(&[("x.txt", b"zip inside")]).unwrap();
    test_dir.create_file("fake.tar", &zip).unwrap();
    let bz2 = tar_bz2_bytes(&[("y.txt", b"bz2 inside")]).unwrap();
    test_dir.create_file("wrong.gz", &bz2).unwrap();

    let observer = Arc::new(RecordingObserver::new());
    let report = Walker::new(WalkOptions::default())
        .with_observer(observer.clone())
        .unpack_tree(test_dir.path())
        .unwrap();

    assert!(report.is_clean());
    assert_tree(&test_dir.join("fake"), &[("x.txt", b"zip inside")]).unwrap();
    assert_tree(&test_dir.join("wrong"), &[("y.txt", b"bz2 inside")]).unwrap();

    let formats: Vec<ArchiveFormat> = observer
        .events()
        .into_iter()
        .filter_map(|event| match event {
            WalkEvent::ExtractionSucceeded { format, .. } => Some(format),
            _ => None,
        })
        .collect();
    assert_eq!(formats, vec![ArchiveFormat::Zip, ArchiveFormat::TarBz2]);
}

#[test]
fn test_corrupt_archive_does_not_stop_siblings() {
    let test_dir = TestDir::new().unwrap();
    test_dir.create_file("a_broken.zip", &corrupt_bytes()).unwrap();
    let gz = tar_gz_bytes(&[("ok.txt", b"ok")]).unwrap();
    test_dir.create_file("b_good.tgz", &gz).unwrap();

    let observer = Arc::new(RecordingObserver::new());
    let report = Walker::new(WalkOptions {
        delete_after_extract: true,
        ..WalkOptions::default()
    })
    .with_observer(observer.clone())
    .unpack_tree(test_dir.path())
    .unwrap();

    assert_eq!(report.failed, vec![test_dir.join("a_broken.zip")]);
    assert_eq!(report.extracted, vec![test_dir.join("b_good")]);
    assert!(test_dir.join("a_broken.zip").exists());
    assert_absent(test_dir.path(), "a_broken");
    assert_absent(test_dir.path(), "b_good.tgz");

    assert_eq!(observer.extraction_failures(), 1);
    assert_eq!(observer.probe_failures(), 5);
}

#[test]
fn test_archives_in_subdirectories_are_found() {
    let test_dir = TestDir::new().unwrap();
    test_dir.create_dir("level1/level2").unwrap();
    write_zip(&test_dir.join("level1/level2/deep.zip"), &[("x.txt", b"x")]).unwrap();
    test_dir.create_file("level1/readme.txt", b"not an archive").unwrap();

    let report = unpack_tree(test_dir.path(), false).unwrap();

    assert_eq!(report.archives_found, 1);
    assert!(test_dir.join("level1/level2/deep/x.txt").exists());
}

#[test]
fn test_empty_tree_reports_nothing() {
    let test_dir = TestDir::new().unwrap();

    let report = unpack_tree(test_dir.path(), true).unwrap();

    assert_eq!(report.archives_found, 0);
    assert!(report.is_clean());
}
