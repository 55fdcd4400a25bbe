mod common;

use common::{items, MidpointJitter, RecordingSleeper, Reply, ScriptedTable};
use s3ddb::batch::{Backoff, Batch, BatchWriter, RandomJitter};
use s3ddb::config::WriterConfig;
use s3ddb::store::StoreError;
use std::sync::Arc;
use std::time::Duration;

fn writer_for(table: &Arc<ScriptedTable>, sleeper: &Arc<RecordingSleeper>) -> BatchWriter {
    BatchWriter::new(table.clone(), "readings", &WriterConfig::default())
        .with_sleeper(sleeper.clone())
        .with_backoff(Backoff::new(
            Duration::from_millis(1000),
            Duration::from_millis(3000),
            Arc::new(MidpointJitter),
        ))
}

fn batch(n: usize) -> Batch {
    Batch {
        index: 0,
        items: items(n),
    }
}

#[tokio::test]
async fn test_single_accepting_call() {
    let table = Arc::new(ScriptedTable::accepting());
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);

    let report = writer.write(batch(25)).await.unwrap();

    assert_eq!(report.items, 25);
    assert_eq!(report.attempts, 1);
    assert_eq!(table.call_count(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_unprocessed_items_are_resubmitted_until_empty() {
    // 25 submitted, 3 handed back, then 1 of those 3 handed back again
    let table = Arc::new(ScriptedTable::new(vec![
        Reply::Unprocessed(vec![4, 10, 24]),
        Reply::Unprocessed(vec![1]),
        Reply::Accept,
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);
    let submitted = items(25);

    let report = writer
        .write(Batch {
            index: 3,
            items: submitted.clone(),
        })
        .await
        .unwrap();

    assert_eq!(report.batch_index, 3);
    assert_eq!(report.items, 25);
    assert_eq!(report.attempts, 3);

    let calls = table.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], submitted);
    assert_eq!(
        calls[1],
        vec![
            submitted[4].clone(),
            submitted[10].clone(),
            submitted[24].clone()
        ]
    );
    assert_eq!(calls[2], vec![submitted[10].clone()]);

    // One delay between each pair of submissions
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(2000); 2]);
}

#[tokio::test]
async fn test_throttled_batch_is_resubmitted_in_full() {
    let table = Arc::new(ScriptedTable::new(vec![
        Reply::Error("ProvisionedThroughputExceededException"),
        Reply::Accept,
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);
    let submitted = items(25);

    let report = writer
        .write(Batch {
            index: 0,
            items: submitted.clone(),
        })
        .await
        .unwrap();

    assert_eq!(report.attempts, 2);
    let calls = table.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], submitted);
    assert_eq!(calls[1], submitted);
    assert_eq!(sleeper.delays().len(), 1);
}

#[tokio::test]
async fn test_throttle_after_partial_failure_resubmits_remainder() {
    let table = Arc::new(ScriptedTable::new(vec![
        Reply::Unprocessed(vec![0, 1]),
        Reply::Error("ThrottlingException"),
        Reply::Accept,
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);
    let submitted = items(5);

    writer
        .write(Batch {
            index: 0,
            items: submitted.clone(),
        })
        .await
        .unwrap();

    let calls = table.calls();
    let remainder = vec![submitted[0].clone(), submitted[1].clone()];
    assert_eq!(calls[1], remainder);
    assert_eq!(calls[2], remainder);
}

#[tokio::test]
async fn test_throttling_has_no_retry_ceiling() {
    let mut replies = vec![Reply::Error("ThrottlingException"); 200];
    replies.push(Reply::Accept);
    let table = Arc::new(ScriptedTable::new(replies));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);

    let report = writer.write(batch(3)).await.unwrap();

    assert_eq!(report.attempts, 201);
    assert_eq!(sleeper.delays().len(), 200);
}

#[tokio::test]
async fn test_retry_delays_fall_in_window() {
    let mut replies = vec![Reply::Error("ProvisionedThroughputExceededException"); 100];
    replies.push(Reply::Accept);
    let table = Arc::new(ScriptedTable::new(replies));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = BatchWriter::new(table.clone(), "readings", &WriterConfig::default())
        .with_sleeper(sleeper.clone())
        .with_backoff(Backoff::new(
            Duration::from_millis(1000),
            Duration::from_millis(3000),
            Arc::new(RandomJitter),
        ));

    writer.write(batch(1)).await.unwrap();

    let delays = sleeper.delays();
    assert_eq!(delays.len(), 100);
    for delay in delays {
        assert!(delay >= Duration::from_millis(1000), "{:?}", delay);
        assert!(delay < Duration::from_millis(3000), "{:?}", delay);
    }
}

#[tokio::test]
async fn test_non_throttling_error_is_fatal_without_retry() {
    let table = Arc::new(ScriptedTable::new(vec![Reply::Error("ValidationException")]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);

    let err = writer
        .write(Batch {
            index: 7,
            items: items(10),
        })
        .await
        .unwrap_err();

    assert_eq!(err.batch_index, 7);
    assert_eq!(err.attempts, 1);
    assert_eq!(err.pending, 10);
    assert_eq!(err.source.code(), Some("ValidationException"));
    assert_eq!(table.call_count(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_fatal_error_after_retries_reports_remaining_items() {
    let table = Arc::new(ScriptedTable::new(vec![
        Reply::Unprocessed(vec![2, 3]),
        Reply::Error("ThrottlingException"),
        Reply::Error("ResourceNotFoundException"),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);

    let err = writer.write(batch(4)).await.unwrap_err();

    assert_eq!(err.attempts, 3);
    assert_eq!(err.pending, 2);
    assert_eq!(err.source.code(), Some("ResourceNotFoundException"));
    assert_eq!(sleeper.delays().len(), 2);
}

#[tokio::test]
async fn test_transport_error_is_fatal() {
    let table = Arc::new(ScriptedTable::new(vec![Reply::Transport]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let writer = writer_for(&table, &sleeper);

    let err = writer.write(batch(2)).await.unwrap_err();

    assert!(matches!(err.source, StoreError::Transport(_)));
    assert_eq!(table.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_sleeper_waits_between_attempts() {
    let table = Arc::new(ScriptedTable::new(vec![
        Reply::Error("ThrottlingException"),
        Reply::Accept,
    ]));
    let writer = BatchWriter::new(table.clone(), "readings", &WriterConfig::default());

    let started = tokio::time::Instant::now();
    writer.write(batch(2)).await.unwrap();
    let waited = started.elapsed();

    assert!(waited >= Duration::from_millis(1000), "{:?}", waited);
    assert!(waited < Duration::from_millis(3000), "{:?}", waited);
}
