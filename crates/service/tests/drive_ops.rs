use std::sync::Arc;
use std::time::Duration;

use common::testkit::MemoryStorage;
use service::confirm::AlwaysConfirm;
use service::drive_ops::*;
use service::{DriveState, ServiceConfig};

fn drive(page_size: usize) -> (Arc<MemoryStorage>, DriveState) {
    let storage = Arc::new(MemoryStorage::new().with_page_size(page_size));
    storage.add_bucket("photos-project", "photos");
    storage.add_bucket("logs-project", "logs");
    let config = ServiceConfig {
        project: Some("photos-project".to_string()),
        ..ServiceConfig::default()
    };
    let state = DriveState::with_api(storage.clone(), &config);
    (storage, state)
}

#[tokio::test]
async fn recursive_bucket_removal_deletes_every_object() -> anyhow::Result<()> {
    let (storage, state) = drive(1000);
    let n = 25;
    for i in 0..n {
        storage.put("logs", &format!("2024/{:02}/run.log", i), b"log line");
    }

    let options = RemoveOptions {
        recurse: true,
        force: true,
    };
    let outcome = remove_item("logs", options, &mut AlwaysConfirm, &state).await?;

    assert!(outcome.bucket_removed);
    assert_eq!(outcome.objects_removed, n);
    assert!(!storage.has_bucket("logs"));

    let calls = storage.calls();
    // Direct delete fails with a conflict, then the retry succeeds.
    assert_eq!(calls.delete_bucket, 2);
    assert_eq!(calls.delete_object, n);
    Ok(())
}

#[tokio::test]
async fn drive_listing_skips_forbidden_projects() -> anyhow::Result<()> {
    let (storage, state) = drive(1000);
    storage.add_bucket("locked-project", "secrets");
    storage.forbid_project("locked-project");

    let names = get_child_names("", ListOptions::default(), &state).await?;
    // Grouped by project, locked-project skipped.
    assert_eq!(names, vec!["logs", "photos"]);
    assert!(has_children("", &state).await?);
    Ok(())
}

#[tokio::test]
async fn new_copy_read_and_remove() -> anyhow::Result<()> {
    let (storage, state) = drive(1000);

    new_item("albums", NewItemOptions::bucket(None), &state).await?;
    assert!(item_exists("albums", &state).await?);

    new_item("photos/2024", NewItemOptions::folder(), &state).await?;
    new_item(
        "photos/2024/beach.jpg",
        NewItemOptions::file(&b"jpeg bytes"[..]),
        &state,
    )
    .await?;
    assert!(is_container("photos/2024", &state).await?);
    assert!(has_children("photos/2024", &state).await?);

    match get_item("photos/2024/beach.jpg", &state).await? {
        DriveItem::Object(record) => {
            assert_eq!(record.content_type.as_deref(), Some("image/jpeg"));
        }
        other => panic!("unexpected item {:?}", other),
    }

    let copied = copy_item(
        "photos/2024",
        "albums/summer",
        CopyOptions { recurse: true },
        &state,
    )
    .await?;
    assert_eq!(copied.len(), 2);
    assert_eq!(
        storage.object_names("albums"),
        vec!["summer/", "summer/beach.jpg"]
    );

    let reader = get_content_reader("albums/summer/beach.jpg", &state).await?;
    assert_eq!(reader.text(), "jpeg bytes");

    let options = RemoveOptions {
        recurse: true,
        force: true,
    };
    remove_item("photos/2024", options, &mut AlwaysConfirm, &state).await?;
    assert!(!item_exists("photos/2024", &state).await?);
    assert!(!item_exists("photos/2024/beach.jpg", &state).await?);
    Ok(())
}

#[tokio::test]
async fn truncated_bucket_queries_stay_correct() -> anyhow::Result<()> {
    let (storage, state) = drive(3);
    for name in ["a.txt", "b.txt", "c.txt", "d/e.txt", "f/", "g/h/i.txt"] {
        storage.put("photos", name, name.as_bytes());
    }

    assert!(item_exists("photos/g/h/i.txt", &state).await?);
    assert!(is_container("photos/g", &state).await?);
    assert!(is_container("photos/f", &state).await?);
    assert!(!has_children("photos/f", &state).await?);
    assert!(!item_exists("photos/zzz", &state).await?);

    let names = get_child_names("photos", ListOptions::default(), &state).await?;
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt", "d", "f", "g"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn remote_changes_show_up_after_staleness() -> anyhow::Result<()> {
    let (storage, state) = drive(1000);
    assert!(!item_exists("photos/late.txt", &state).await?);

    storage.put("photos", "late.txt", b"late");
    assert!(!item_exists("photos/late.txt", &state).await?);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(item_exists("photos/late.txt", &state).await?);
    Ok(())
}

#[tokio::test]
async fn writer_and_clear_round_trip() -> anyhow::Result<()> {
    let (storage, state) = drive(1000);
    let mut writer = get_content_writer("photos/notes.md", &state).await?;
    writer.write_line("# Trip");
    writer.write_line("sunny");
    writer.close().await?;

    let reader = get_content_reader("photos/notes.md", &state).await?;
    assert_eq!(reader.lines(), vec!["# Trip", "sunny"]);

    clear_content("photos/notes.md", &state).await?;
    assert!(storage.content("photos", "notes.md").unwrap().is_empty());
    Ok(())
}
