//! Redis job store integration tests.

use fileforge_jobstore::{JobStore, RedisJobStore};
use fileforge_models::{CompressionMetrics, JobRecord, JobStatus, StatusUpdate};

/// Test record write and read cycle.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_record_roundtrip() {
    dotenvy::dotenv().ok();

    let store = RedisJobStore::from_env().expect("Failed to create store");
    let job_id = format!("it-{}", uuid::Uuid::new_v4());

    let record = JobRecord::new(&job_id).with_blob_key("uploads/test.png");
    store.put_record(&record).await.expect("Failed to put record");

    let loaded = store.get_record(&job_id).await.expect("Failed to load record");
    assert_eq!(loaded.job_id, job_id);
    assert_eq!(loaded.status, JobStatus::Pending);
    assert_eq!(loaded.blob_key.as_deref(), Some("uploads/test.png"));
}

/// Test that the transition guard holds through the persistence layer.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_terminal_update_is_dropped() {
    dotenvy::dotenv().ok();

    let store = RedisJobStore::from_env().expect("Failed to create store");
    let job_id = format!("it-{}", uuid::Uuid::new_v4());

    store
        .put_record(&JobRecord::new(&job_id))
        .await
        .expect("Failed to put record");

    let update = StatusUpdate::new(JobStatus::Completed)
        .with_progress(100)
        .with_metrics(CompressionMetrics::new(1000, 400));
    store
        .update_status(&job_id, update)
        .await
        .expect("Failed to update");

    // A later update against the terminal record must not stick.
    store
        .update_status(&job_id, StatusUpdate::new(JobStatus::Processing).with_progress(10))
        .await
        .expect("Failed to update");

    let loaded = store.get_record(&job_id).await.expect("Failed to load record");
    assert_eq!(loaded.status, JobStatus::Completed);
    assert_eq!(loaded.progress, 100);
    assert_eq!(loaded.compression_savings, Some(60.0));
}

/// Test upsert behavior for an unknown job id.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_update_creates_record_when_missing() {
    dotenvy::dotenv().ok();

    let store = RedisJobStore::from_env().expect("Failed to create store");
    let job_id = format!("it-{}", uuid::Uuid::new_v4());

    store
        .update_status(&job_id, StatusUpdate::new(JobStatus::Failed).with_progress(0))
        .await
        .expect("Failed to update");

    let loaded = store.get_record(&job_id).await.expect("Failed to load record");
    assert_eq!(loaded.status, JobStatus::Failed);
}
