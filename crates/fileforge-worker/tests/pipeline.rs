//! End-to-end pipeline tests against in-memory collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fileforge_jobstore::{JobStore, JobStoreError, JobStoreResult};
use fileforge_models::{
    JobMessage, JobRecord, JobStatus, Operation, ProcessingResult, StatusUpdate,
};
use fileforge_processors::{FileProcessor, ProcessorRegistry, ProcessorResult};
use fileforge_queue::{MessageQueue, QueueResult, RawMessage};
use fileforge_storage::{BlobStorage, StorageError, StorageResult};
use fileforge_worker::{MessageHandler, WorkerError, WorkerLoop};

#[derive(Default)]
struct FakeQueue {
    pending: Mutex<Vec<RawMessage>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeQueue {
    fn push(&self, receipt: &str, body: &str) {
        self.pending.lock().unwrap().push(RawMessage {
            receipt: receipt.to_string(),
            body: body.to_string(),
        });
    }

    fn deleted_receipts(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageQueue for FakeQueue {
    async fn poll_messages(&self) -> QueueResult<Vec<RawMessage>> {
        Ok(self.pending.lock().unwrap().drain(..).collect())
    }

    async fn delete_message(&self, receipt: &str) -> QueueResult<()> {
        self.deleted.lock().unwrap().push(receipt.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct FakeBlobStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl FakeBlobStore {
    fn seed(&self, key: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, "application/octet-stream".into()));
    }

    fn stored(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl BlobStorage for FakeBlobStore {
    async fn get_file(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn put_file(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    fn generate_download_url(&self, key: &str) -> String {
        format!("https://files.test/{}", key)
    }
}

/// In-memory job store applying the same transition rules as the Redis one.
#[derive(Default)]
struct FakeJobStore {
    records: Mutex<HashMap<String, JobRecord>>,
    history: Mutex<Vec<(JobStatus, u8)>>,
}

impl FakeJobStore {
    fn seed(&self, record: JobRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.job_id.clone(), record);
    }

    fn record(&self, job_id: &str) -> Option<JobRecord> {
        self.records.lock().unwrap().get(job_id).cloned()
    }

    fn status_history(&self) -> Vec<(JobStatus, u8)> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobStore for FakeJobStore {
    async fn get_record(&self, job_id: &str) -> JobStoreResult<JobRecord> {
        self.record(job_id)
            .ok_or_else(|| JobStoreError::not_found(job_id))
    }

    async fn update_status(&self, job_id: &str, update: StatusUpdate) -> JobStoreResult<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(job_id.to_string())
            .or_insert_with(|| JobRecord::new(job_id));
        if record.apply_update(&update) {
            self.history
                .lock()
                .unwrap()
                .push((record.status, record.progress));
        }
        Ok(())
    }
}

/// Stub strategy that accepts everything and returns fixed bytes.
struct StubProcessor {
    output: Vec<u8>,
}

#[async_trait]
impl FileProcessor for StubProcessor {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn can_process(&self, _operation: Operation, _target_format: Option<&str>) -> bool {
        true
    }

    async fn process(
        &self,
        _input: &[u8],
        _message: &JobMessage,
    ) -> ProcessorResult<ProcessingResult> {
        Ok(ProcessingResult::new(
            self.output.clone(),
            "application/octet-stream",
            "bin",
        ))
    }
}

fn stub_registry(output: Vec<u8>) -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(StubProcessor { output }));
    registry
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([x as u8, y as u8, 128]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn body(message: &JobMessage) -> String {
    serde_json::to_string(message).unwrap()
}

fn handler(
    registry: ProcessorRegistry,
    storage: &Arc<FakeBlobStore>,
    jobs: &Arc<FakeJobStore>,
) -> MessageHandler<FakeBlobStore, FakeJobStore> {
    MessageHandler::new(registry, Arc::clone(storage), Arc::clone(jobs))
}

#[tokio::test]
async fn test_compress_image_happy_path() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());

    let source = png_bytes();
    let original_size = source.len() as u64;
    storage.seed("uploads/job-1.png", source);
    jobs.seed(JobRecord::new("job-1").with_blob_key("uploads/job-1.png"));

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let message = JobMessage::new("job-1", Operation::Compress).with_quality(80);

    handler.handle(&body(&message)).await.unwrap();

    let record = jobs.record("job-1").unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert_eq!(
        record.download_url.as_deref(),
        Some("https://files.test/processed/job-1_compressed.png")
    );
    assert_eq!(record.original_file_size, Some(original_size));
    assert!(record.processed_file_size.is_some());
    assert!(record.compression_savings.is_some());

    let (stored, content_type) = storage.stored("processed/job-1_compressed.png").unwrap();
    assert!(!stored.is_empty());
    assert_eq!(content_type, "image/png");

    // Staged progress in order, each stage at least once.
    let history = jobs.status_history();
    let progresses: Vec<u8> = history.iter().map(|(_, p)| *p).collect();
    assert_eq!(progresses, vec![0, 25, 75, 90, 100]);
    assert_eq!(history.last().unwrap().0, JobStatus::Completed);
}

#[tokio::test]
async fn test_convert_image_uses_plain_output_key() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    storage.seed("uploads/job-2.png", png_bytes());
    jobs.seed(JobRecord::new("job-2").with_blob_key("uploads/job-2.png"));

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let message = JobMessage::new("job-2", Operation::Convert).with_target_format("jpg");

    handler.handle(&body(&message)).await.unwrap();

    let record = jobs.record("job-2").unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    // Convert jobs carry no compression metrics.
    assert_eq!(record.original_file_size, None);
    assert_eq!(record.compression_savings, None);
    assert!(storage.stored("processed/job-2.jpg").is_some());
}

#[tokio::test]
async fn test_missing_record_fails_job_and_deletes_message() {
    let queue = Arc::new(FakeQueue::default());
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());

    let message = JobMessage::new("job-missing", Operation::Convert).with_target_format("jpg");
    queue.push("r-1", &body(&message));

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let worker = WorkerLoop::new(Arc::clone(&queue), handler, Duration::from_secs(1));

    let handled = worker.poll_once().await.unwrap();
    assert_eq!(handled, 1);
    assert_eq!(queue.deleted_receipts(), vec!["r-1".to_string()]);

    let record = jobs.record("job-missing").unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.progress, 0);
}

#[tokio::test]
async fn test_missing_record_error_message() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);

    let message = JobMessage::new("job-gone", Operation::Convert).with_target_format("jpg");
    let err = handler.handle(&body(&message)).await.unwrap_err();
    assert_eq!(err.to_string(), "Job record not found: job-gone");
}

#[tokio::test]
async fn test_unsupported_format_fails_before_any_io() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    jobs.seed(JobRecord::new("job-3").with_blob_key("uploads/job-3.bin"));

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let message = JobMessage::new("job-3", Operation::Convert).with_target_format("xyz");

    let err = handler.handle(&body(&message)).await.unwrap_err();
    assert!(matches!(err, WorkerError::NoProcessorFound { .. }));
    assert_eq!(
        err.to_string(),
        "No processor found for operation 'convert' and format 'xyz'"
    );

    let record = jobs.record("job-3").unwrap();
    assert_eq!(record.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_savings_floored_when_output_grows() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    storage.seed("uploads/job-4.bin", vec![0u8; 100]);
    jobs.seed(JobRecord::new("job-4").with_blob_key("uploads/job-4.bin"));

    let handler = handler(stub_registry(vec![0u8; 250]), &storage, &jobs);
    let message = JobMessage::new("job-4", Operation::Compress);

    handler.handle(&body(&message)).await.unwrap();

    let record = jobs.record("job-4").unwrap();
    assert_eq!(record.original_file_size, Some(100));
    assert_eq!(record.processed_file_size, Some(250));
    assert_eq!(record.compression_savings, Some(0.0));
}

#[tokio::test]
async fn test_terminal_record_is_not_regressed() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    storage.seed("uploads/job-5.bin", vec![1u8; 10]);

    let mut record = JobRecord::new("job-5").with_blob_key("uploads/job-5.bin");
    record.apply_update(&StatusUpdate::new(JobStatus::Completed).with_progress(100));
    jobs.seed(record);

    let handler = handler(stub_registry(vec![1u8; 5]), &storage, &jobs);
    let message = JobMessage::new("job-5", Operation::Compress);

    // The handler runs, but every status write is dropped by the guard.
    handler.handle(&body(&message)).await.unwrap();

    let record = jobs.record("job-5").unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert!(jobs.status_history().is_empty());
}

#[tokio::test]
async fn test_malformed_payload_still_deletes_message() {
    let queue = Arc::new(FakeQueue::default());
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    queue.push("r-bad", "this is not json");

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let worker = WorkerLoop::new(Arc::clone(&queue), handler, Duration::from_secs(1));

    worker.poll_once().await.unwrap();
    assert_eq!(queue.deleted_receipts(), vec!["r-bad".to_string()]);
    // No job id could be recovered, so no record was written.
    assert!(jobs.record("r-bad").is_none());
}

#[tokio::test]
async fn test_partial_payload_recovers_job_id_for_failure() {
    let queue = Arc::new(FakeQueue::default());
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    queue.push("r-partial", r#"{"jobId":"job-6","operation":"shred"}"#);

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let worker = WorkerLoop::new(Arc::clone(&queue), handler, Duration::from_secs(1));

    worker.poll_once().await.unwrap();
    assert_eq!(queue.deleted_receipts(), vec!["r-partial".to_string()]);

    let record = jobs.record("job-6").unwrap();
    assert_eq!(record.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_blob_missing_maps_to_not_found() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    jobs.seed(JobRecord::new("job-7").with_blob_key("uploads/nope.png"));

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let message = JobMessage::new("job-7", Operation::Compress);

    let err = handler.handle(&body(&message)).await.unwrap_err();
    assert_eq!(err.to_string(), "Source file not found: uploads/nope.png");
    assert_eq!(jobs.record("job-7").unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn test_record_without_blob_key_fails() {
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());
    jobs.seed(JobRecord::new("job-8"));

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let message = JobMessage::new("job-8", Operation::Compress);

    let err = handler.handle(&body(&message)).await.unwrap_err();
    assert!(matches!(err, WorkerError::NotFound(_)));
    assert_eq!(jobs.record("job-8").unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn test_shutdown_stops_the_loop() {
    let queue = Arc::new(FakeQueue::default());
    let storage = Arc::new(FakeBlobStore::default());
    let jobs = Arc::new(FakeJobStore::default());

    let handler = handler(ProcessorRegistry::with_default_processors(), &storage, &jobs);
    let worker = Arc::new(WorkerLoop::new(
        Arc::clone(&queue),
        handler,
        Duration::from_millis(10),
    ));

    let shutdown = worker.shutdown_handle();
    let run = tokio::spawn({
        let worker = Arc::clone(&worker);
        async move { worker.run().await }
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown.stop();

    tokio::time::timeout(Duration::from_secs(1), run)
        .await
        .expect("loop did not stop after shutdown")
        .unwrap();
}
