//! Redb-backed library: texts, progress tracks and cascading deletes survive
//! reopening the database file.

use std::sync::Arc;

use tempfile::tempdir;
use typetrace_core::{
    Config, InputEvent, Library, Practice, PracticeMode, ProgressStore, RedbLibrary, TextSource,
};

#[test]
fn test_empty_database_reads_as_empty() {
    let dir = tempdir().unwrap();
    let lib = RedbLibrary::new(dir.path().join("library.redb")).unwrap();
    assert!(lib.list_texts().unwrap().is_empty());
    assert!(lib.text("1").unwrap().is_none());
    assert!(lib.progress("1", PracticeMode::Trace).unwrap().is_none());
    assert!(lib.all_progress().unwrap().is_empty());
    assert!(!lib.delete_text("1").unwrap());
}

#[test]
fn test_texts_and_progress_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("library.redb");

    let (first, second) = {
        let lib = Library::new_redb(&path).unwrap();
        let first = lib.save_text("first", "ab\ncd").unwrap();
        let second = lib.save_text("second", "xyz").unwrap();
        lib.save_cursor(&first, PracticeMode::Trace, 3).unwrap();
        lib.save_cursor(&first, PracticeMode::Copy, 1).unwrap();
        lib.save_cursor(&first, PracticeMode::Trace, 4).unwrap();
        (first, second)
    };

    let lib = Library::new_redb(&path).unwrap();
    let texts = lib.list_texts().unwrap();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0].id, first);
    assert_eq!(texts[1].name, "second");
    assert_eq!(lib.reference_text(&second).unwrap().as_deref(), Some("xyz"));
    assert_eq!(lib.load_cursor(&first, PracticeMode::Trace).unwrap(), Some(4));
    assert_eq!(lib.load_cursor(&first, PracticeMode::Copy).unwrap(), Some(1));
    assert_eq!(lib.load_cursor(&second, PracticeMode::Trace).unwrap(), None);
}

#[test]
fn test_delete_removes_all_progress_of_text() {
    let dir = tempdir().unwrap();
    let lib = Library::new_redb(dir.path().join("library.redb")).unwrap();
    let gone = lib.save_text("gone", "abc").unwrap();
    let kept = lib.save_text("kept", "def").unwrap();
    lib.save_cursor(&gone, PracticeMode::Trace, 1).unwrap();
    lib.save_cursor(&gone, PracticeMode::Copy, 2).unwrap();
    lib.save_cursor(&kept, PracticeMode::Copy, 3).unwrap();

    assert!(lib.delete_text(&gone).unwrap());
    assert!(lib.text(&gone).unwrap().is_none());
    let progress = lib.all_progress().unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].text_id, kept);
    assert_eq!(progress[0].position, 3);
}

#[test]
fn test_practice_resumes_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("library.redb");

    let id = {
        let lib = Arc::new(Library::new_redb(&path).unwrap());
        let id = lib.save_text("t", "hello").unwrap();
        let mut p = Practice::start(
            lib.as_ref(),
            Arc::clone(&lib),
            &id,
            PracticeMode::Trace,
            Config::default(),
        )
        .unwrap();
        for ch in "hel".chars() {
            p.process_event(InputEvent::char(ch));
        }
        assert!(p.close());
        id
    };

    let lib = Arc::new(Library::new_redb(&path).unwrap());
    let p = Practice::start(
        lib.as_ref(),
        Arc::clone(&lib),
        &id,
        PracticeMode::Trace,
        Config::default(),
    )
    .unwrap();
    assert_eq!(p.cursor(), 3);
    assert_eq!(p.progress_percent(), 60.0);
}
