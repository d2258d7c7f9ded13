use std::path::PathBuf;
use std::sync::Arc;

use webext_downloads::engine::{
    DownloadEngine, EngineError, EngineSession, MemoryEngine, SessionRequest,
};
use webext_downloads::{
    DownloadError, DownloadId, DownloadOptions, DownloadService, DownloadState, DownloadsConfig,
    ExtensionInfo, InterruptReason,
};

fn service() -> (MemoryEngine, DownloadService) {
    let engine = MemoryEngine::new(PathBuf::from("/home/user/Downloads"));
    let service = DownloadService::new(Arc::new(engine.clone()), DownloadsConfig::default());
    (engine, service)
}

#[tokio::test]
async fn test_ids_are_unique_and_strictly_increasing() {
    let (_engine, service) = service();
    let first = service.for_extension(ExtensionInfo::new("a@example.com", "A"));
    let second = service.for_extension(ExtensionInfo::new("b@example.com", "B"));

    let mut ids = Vec::new();
    for n in 0..10 {
        let api = if n % 2 == 0 { &first } else { &second };
        ids.push(
            api.download(DownloadOptions::new(format!("https://example.com/{n}.bin")))
                .await
                .unwrap(),
        );
    }

    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ids.first(), Some(&DownloadId(1)));
}

#[tokio::test]
async fn test_pause_right_after_download_keeps_partial_data() {
    let (engine, service) = service();
    let api = service.for_extension(ExtensionInfo::new("a@example.com", "A"));

    let id = api
        .download(DownloadOptions::new("https://x/file.bin"))
        .await
        .unwrap();
    assert_eq!(id, DownloadId(1));

    let session = service.registry().resolve(id).unwrap().session;
    engine.session(session.id()).unwrap().report_progress(1024, None);

    api.pause(id).await.unwrap();
    let item = api.item(id).unwrap();
    assert!(item.can_resume().unwrap());
    assert_eq!(item.state().unwrap(), DownloadState::Interrupted);
    assert_eq!(item.total_bytes().unwrap(), -1);
}

#[tokio::test]
async fn test_cancel_of_never_started_download_removes_it() {
    let (engine, service) = service();
    let owner = ExtensionInfo::new("a@example.com", "A");
    let api = service.for_extension(owner.clone());

    let session = engine
        .create_session(SessionRequest {
            source: "https://x/file.bin".to_string(),
            target: PathBuf::from("/home/user/Downloads/file.bin"),
        })
        .await
        .unwrap();
    let id = service.registry().create(session, Some(owner));
    assert_eq!(id, DownloadId(1));

    api.cancel(id).await.unwrap();
    assert!(service.registry().resolve(id).is_err());
    assert_eq!(
        api.pause(id).await,
        Err(DownloadError::UnknownDownloadId(id))
    );
}

#[tokio::test]
async fn test_failed_restart_is_reported_and_classified() {
    let (engine, service) = service();
    let api = service.for_extension(ExtensionInfo::new("a@example.com", "A"));

    let id = api
        .download(DownloadOptions::new("https://x/file.bin"))
        .await
        .unwrap();
    let memory = engine
        .session(service.registry().resolve(id).unwrap().session.id())
        .unwrap();

    memory.fail(EngineError::SourceFailed("connection reset".into()));
    assert_eq!(
        api.item(id).unwrap().error().unwrap(),
        Some(InterruptReason::NetworkFailed)
    );

    memory.fail_next_start(EngineError::TargetFailed("disk full".into()));
    let err = api.resume(id).await.unwrap_err();
    assert_eq!(err, DownloadError::Engine(EngineError::TargetFailed("disk full".into())));
    assert_eq!(api.last_error(), Some(err));
    assert_eq!(
        api.item(id).unwrap().error().unwrap(),
        Some(InterruptReason::FileFailed)
    );

    api.cancel(id).await.unwrap();
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_remove_file_before_completion_always_fails() {
    let (engine, service) = service();
    let api = service.for_extension(ExtensionInfo::new("a@example.com", "A"));
    let id = api
        .download(DownloadOptions::new("https://x/file.bin"))
        .await
        .unwrap();
    let memory = engine
        .session(service.registry().resolve(id).unwrap().session.id())
        .unwrap();

    // Running
    assert_eq!(
        api.remove_file(id).await,
        Err(DownloadError::DownloadNotComplete(id))
    );

    // Paused with partial data
    memory.report_progress(10, Some(20));
    api.pause(id).await.unwrap();
    assert_eq!(
        api.remove_file(id).await,
        Err(DownloadError::DownloadNotComplete(id))
    );

    // Failed
    memory.fail(EngineError::Other("crashed".into()));
    assert_eq!(
        api.remove_file(id).await,
        Err(DownloadError::DownloadNotComplete(id))
    );
    assert_eq!(
        api.item(id).unwrap().error().unwrap(),
        Some(InterruptReason::Crash)
    );
}

#[tokio::test]
async fn test_on_created_skips_existing_downloads() {
    let (engine, service) = service();
    let api = service.for_extension(ExtensionInfo::new("a@example.com", "A"));

    let before = api
        .download(DownloadOptions::new("https://x/before.bin"))
        .await
        .unwrap();
    engine.add_external_session("https://x/browser.bin", "/home/user/Downloads/browser.bin".into());

    let mut created = api.on_created().await.unwrap();
    assert!(created.try_recv().is_none());

    let after = api
        .download(DownloadOptions::new("https://x/after.bin"))
        .await
        .unwrap();
    engine.add_external_session("https://x/later.bin", "/home/user/Downloads/later.bin".into());

    let first = created.recv().await.unwrap();
    assert_eq!(first.id(), after);
    assert_ne!(first.id(), before);
    assert_eq!(
        first.by_extension_id().unwrap().as_deref(),
        Some("a@example.com")
    );

    let second = created.recv().await.unwrap();
    assert_eq!(second.url().unwrap(), "https://x/later.bin");
    assert_eq!(second.by_extension_id().unwrap(), None);
    assert!(created.try_recv().is_none());

    drop(created);
    assert_eq!(engine.view_count(), 0);
}

#[tokio::test]
async fn test_attribution_is_per_extension() {
    let (_engine, service) = service();
    let saver = service.for_extension(ExtensionInfo::new("saver@example.com", "Saver"));
    let grabber = service.for_extension(ExtensionInfo::new("grabber@example.com", "Grabber"));

    let a = saver
        .download(DownloadOptions::new("https://x/a.bin"))
        .await
        .unwrap();
    let b = grabber
        .download(DownloadOptions::new("https://x/b.bin"))
        .await
        .unwrap();

    let a = saver.info(a).unwrap();
    let b = saver.info(b).unwrap();
    assert_eq!(a.by_extension_id.as_deref(), Some("saver@example.com"));
    assert_eq!(a.by_extension_name.as_deref(), Some("Saver"));
    assert_eq!(b.by_extension_id.as_deref(), Some("grabber@example.com"));
    assert_eq!(b.by_extension_name.as_deref(), Some("Grabber"));
}
