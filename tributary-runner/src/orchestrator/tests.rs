use super::*;
use crate::service::{FixedProcessing, LineageQuery};
use crate::testing::StubNode;
use std::sync::Mutex;
use std::time::Duration;
use tributary_client::{InvokeErrorKind, Verb, methods};
use tributary_core::domain::run::CorrelationId;

fn settings() -> PipelineSettings {
    let mut settings = PipelineSettings::new("transactions_raw", "example_dag");
    settings.requested_by = "runner-test".to_string();
    settings
}

fn orchestrator(node: &Arc<StubNode>, settings: PipelineSettings) -> PipelineOrchestrator {
    PipelineOrchestrator::new(node.clone(), settings)
        .with_processing(Arc::new(FixedProcessing::new(1_234, Duration::from_secs(1))))
}

async fn run_once(node: &Arc<StubNode>, settings: PipelineSettings) -> RunReport {
    orchestrator(node, settings)
        .run(&CancellationToken::new())
        .await
        .unwrap()
}

fn position(order: &[String], method: &str) -> usize {
    order.iter().position(|m| m == method).unwrap()
}

#[tokio::test]
async fn test_successful_run_is_bracketed_by_start_and_end() {
    let node = Arc::new(StubNode::new());

    let report = run_once(&node, settings()).await;

    assert!(report.succeeded());
    assert!(report.fully_recorded());
    assert_eq!(report.run.status(), RunStatus::Succeeded);
    assert_eq!(report.completed_steps, Step::ALL.to_vec());
    assert!(report.event_failures.is_empty());
    assert_eq!(
        node.event_statuses(),
        vec![
            "start",
            "dag_config_retrieved",
            "dag_triggered",
            "lineage_recorded",
            "end"
        ]
    );

    for event in &report.events {
        assert_eq!(event.correlation_id, *report.run.correlation_id());
        assert_eq!(event.dataset, "transactions_raw");
        assert_eq!(event.pipeline, "data_engineering_pipeline");
        assert_eq!(event.process_start_time, report.run.start_time);
    }
}

#[tokio::test]
async fn test_null_dataset_config_halts_before_start() {
    let node = Arc::new(StubNode::new().null_on(methods::DATASET_CONFIG));

    let report = run_once(&node, settings()).await;

    assert_eq!(report.run.status(), RunStatus::Failed);
    assert_eq!(report.failed_step(), Some(Step::FetchDatasetConfig));
    assert_eq!(
        node.methods(),
        vec![
            methods::GENERATE_CORRELATION_ID,
            methods::CONFIG,
            methods::DATASET_CONFIG
        ]
    );
    assert!(report.events.is_empty());

    match report.outcome {
        RunOutcome::Failed { error, .. } => assert_eq!(error.kind, InvokeErrorKind::Data),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_dataset_config_halts_before_start() {
    let node = Arc::new(StubNode::new().with_dataset(serde_json::json!({
        "name": "transactions_raw",
        "source": "",
        "destination": "s3://clean"
    })));

    let report = run_once(&node, settings()).await;

    assert_eq!(report.failed_step(), Some(Step::FetchDatasetConfig));
    assert_eq!(node.count(methods::RECORD_EVENT), 0);
}

#[tokio::test]
async fn test_events_for_returns_ordered_history() {
    let node = Arc::new(StubNode::new());
    let report = run_once(&node, settings()).await;
    let query = LineageQuery::new(NodeApi::new(node.clone()));

    let events = query
        .events_for("transactions_raw", report.run.correlation_id())
        .await
        .unwrap();

    assert!(events.len() >= 5);
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(events.first().map(|e| e.status), Some(EventStatus::Start));
    assert_eq!(events.last().map(|e| e.status), Some(EventStatus::End));
    assert_eq!(events, report.events);

    let again = query
        .events_for("transactions_raw", report.run.correlation_id())
        .await
        .unwrap();
    assert_eq!(events, again);
}

#[tokio::test]
async fn test_events_for_unknown_run_is_empty() {
    let node = Arc::new(StubNode::new());
    let query = LineageQuery::new(NodeApi::new(node.clone()));

    let events = query
        .events_for("transactions_raw", &CorrelationId::new("corr-missing"))
        .await
        .unwrap();

    assert!(events.is_empty());
}

#[tokio::test]
async fn test_sequential_runs_have_distinct_correlation_ids() {
    let node = Arc::new(StubNode::new());
    let orchestrator = orchestrator(&node, settings());
    let cancel = CancellationToken::new();

    let first = orchestrator.run(&cancel).await.unwrap();
    let second = orchestrator.run(&cancel).await.unwrap();

    assert_ne!(first.run.correlation_id(), second.run.correlation_id());
    assert_eq!(node.count(methods::GENERATE_CORRELATION_ID), 2);
}

#[tokio::test]
async fn test_concurrent_runs_keep_separate_state() {
    let node = Arc::new(StubNode::new());
    let orchestrator = orchestrator(&node, settings());
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(orchestrator.run(&cancel), orchestrator.run(&cancel));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(first.succeeded());
    assert!(second.succeeded());
    assert_ne!(first.run.correlation_id(), second.run.correlation_id());
    assert_eq!(node.count(methods::RECORD_LINEAGE), 2);

    let query = LineageQuery::new(NodeApi::new(node.clone()));
    for report in [&first, &second] {
        let id = report.run.correlation_id();
        let events = query.events_for("transactions_raw", id).await.unwrap();

        assert!(events.iter().all(|e| e.correlation_id == *id));
        assert_eq!(events.first().map(|e| e.status), Some(EventStatus::Start));
        assert_eq!(events.last().map(|e| e.status), Some(EventStatus::End));
        assert_eq!(events, report.events);
        assert!(report.events.iter().all(|e| e.correlation_id == *id));
    }
}

#[tokio::test]
async fn test_trigger_failure_skips_lineage_and_records_failed() {
    let node = Arc::new(StubNode::new().fail_on(methods::TRIGGER_DAG));

    let report = run_once(&node, settings()).await;

    assert_eq!(report.run.status(), RunStatus::Failed);
    assert_eq!(report.failed_step(), Some(Step::TriggerDag));
    assert_eq!(node.count(methods::RECORD_LINEAGE), 0);
    assert_eq!(node.count(methods::GET_LINEAGE), 0);
    assert_eq!(
        node.event_statuses(),
        vec!["start", "dag_config_retrieved", "failed"]
    );

    let failed = report.events.last().unwrap();
    assert_eq!(failed.status, EventStatus::Failed);
    assert_eq!(failed.details["step"], "trigger_dag");
    assert_eq!(failed.details["kind"], "protocol");
    assert!(failed.details["error"].as_str().unwrap().contains("triggerDag"));
}

#[tokio::test]
async fn test_lineage_recorded_once_between_processing_and_end() {
    let node = Arc::new(StubNode::new());

    let report = run_once(&node, settings()).await;

    let lineage = node.payloads(methods::RECORD_LINEAGE);
    assert_eq!(lineage.len(), 1);
    assert_eq!(
        lineage[0],
        serde_json::json!({
            "dataset": "transactions_raw",
            "lineageData": {
                "input": "s3://raw",
                "output": "s3://clean",
                "transformation": "data_engineering_pipeline",
                "rows_processed": 1_234
            }
        })
    );

    let steps = &report.completed_steps;
    let processed = steps.iter().position(|s| *s == Step::ProcessData);
    let recorded = steps.iter().position(|s| *s == Step::RecordLineage);
    assert!(processed < recorded);

    let order = node.methods();
    let lineage_at = position(&order, methods::RECORD_LINEAGE);
    let end_at = order
        .iter()
        .enumerate()
        .filter(|(_, m)| *m == methods::RECORD_EVENT)
        .map(|(i, _)| i)
        .last()
        .unwrap();
    assert!(position(&order, methods::TRIGGER_DAG) < lineage_at);
    assert!(lineage_at < end_at);

    let end = report.events.last().unwrap();
    assert_eq!(end.status, EventStatus::End);
    assert_eq!(end.details["result"], "success");
    assert_eq!(end.details["rows_processed"], 1_234);
}

#[tokio::test]
async fn test_lineage_is_queried_by_destination() {
    let node = Arc::new(StubNode::new());

    let report = run_once(&node, settings()).await;

    let queries = node.payloads(methods::GET_LINEAGE);
    assert_eq!(queries, vec![serde_json::json!({ "dataset": "s3://clean" })]);
    let info = report.artifacts.lineage_info.unwrap();
    assert_eq!(info.edges().len(), 1);
}

#[tokio::test]
async fn test_trigger_request_carries_run_identity() {
    let node = Arc::new(StubNode::new());

    let report = run_once(&node, settings()).await;

    let calls = node.calls();
    let trigger = calls
        .iter()
        .find(|c| c.method == methods::TRIGGER_DAG)
        .unwrap();
    assert_eq!(trigger.verb, Verb::Post);

    let payload = trigger.payload.as_ref().unwrap();
    assert_eq!(payload["dagId"], "example_dag");
    assert_eq!(payload["conf"]["dataset"], "transactions_raw");
    assert_eq!(
        payload["conf"]["correlation_id"],
        report.run.correlation_id().as_str()
    );
    assert_eq!(payload["conf"]["requested_by"], "runner-test");

    let triggered = report
        .events
        .iter()
        .find(|e| e.status == EventStatus::DagTriggered)
        .unwrap();
    assert_eq!(triggered.details["dag_id"], "example_dag");
    assert_eq!(
        triggered.details["dag_trigger_response"]["data"]["status"],
        "success"
    );
}

#[tokio::test]
async fn test_milestone_failure_continues_by_default() {
    let node = Arc::new(StubNode::new().fail_event("dag_triggered"));

    let report = run_once(&node, settings()).await;

    assert!(report.succeeded());
    assert_eq!(report.event_failures.len(), 1);
    assert_eq!(report.event_failures[0].status, EventStatus::DagTriggered);
    assert_eq!(node.count(methods::RECORD_LINEAGE), 1);
    assert_eq!(
        node.event_statuses(),
        vec!["start", "dag_config_retrieved", "lineage_recorded", "end"]
    );
}

#[tokio::test]
async fn test_milestone_failure_aborts_under_abort_policy() {
    let node = Arc::new(StubNode::new().fail_event("dag_triggered"));
    let mut settings = settings();
    settings.event_failure_policy = EventFailurePolicy::Abort;

    let report = run_once(&node, settings).await;

    assert_eq!(report.run.status(), RunStatus::Failed);
    assert_eq!(report.failed_step(), Some(Step::TriggerDag));
    assert_eq!(node.count(methods::RECORD_LINEAGE), 0);
    assert_eq!(
        node.event_statuses(),
        vec!["start", "dag_config_retrieved", "failed"]
    );
}

#[tokio::test]
async fn test_end_event_failure_continues_by_default() {
    let node = Arc::new(StubNode::new().fail_event("end"));

    let report = run_once(&node, settings()).await;

    assert!(report.succeeded());
    assert!(!report.fully_recorded());
    assert_eq!(report.run.status(), RunStatus::Succeeded);
    assert_eq!(report.event_failures.len(), 1);
    assert_eq!(report.event_failures[0].status, EventStatus::End);
    assert_eq!(
        node.event_statuses(),
        vec![
            "start",
            "dag_config_retrieved",
            "dag_triggered",
            "lineage_recorded"
        ]
    );
}

#[tokio::test]
async fn test_end_event_failure_aborts_under_abort_policy() {
    let node = Arc::new(StubNode::new().fail_event("end"));
    let mut settings = settings();
    settings.event_failure_policy = EventFailurePolicy::Abort;

    let report = run_once(&node, settings).await;

    assert!(!report.succeeded());
    assert!(!report.fully_recorded());
    assert_eq!(report.run.status(), RunStatus::Failed);
    assert_eq!(report.failed_step(), Some(Step::RecordEnd));
    assert_eq!(
        node.event_statuses().last().map(String::as_str),
        Some("failed")
    );
}

#[tokio::test]
async fn test_start_event_failure_is_always_fatal() {
    let node = Arc::new(StubNode::new().fail_event("start"));

    let report = run_once(&node, settings()).await;

    assert_eq!(report.failed_step(), Some(Step::RecordStart));
    assert_eq!(node.count(methods::DAG_CONFIG), 0);
    assert_eq!(node.count(methods::TRIGGER_DAG), 0);
    // No failed event without a start event
    assert_eq!(node.count(methods::RECORD_EVENT), 1);
    assert!(report.events.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let node = Arc::new(StubNode::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator(&node, settings()).run(&cancel).await;

    assert!(matches!(result, Err(RunError::Cancelled)));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_at_next_boundary() {
    let node = Arc::new(StubNode::new());
    let cancel = CancellationToken::new();
    let trip = cancel.clone();
    let reporter = move |progress: &Progress| {
        if progress.step == Step::RecordStart {
            trip.cancel();
        }
    };

    let report = orchestrator(&node, settings())
        .with_progress(Arc::new(reporter))
        .run(&cancel)
        .await
        .unwrap();

    assert_eq!(report.run.status(), RunStatus::Cancelled);
    assert!(matches!(
        report.outcome,
        RunOutcome::Cancelled {
            step: Step::FetchDagConfig
        }
    ));
    assert_eq!(node.count(methods::DAG_CONFIG), 0);
    assert_eq!(node.event_statuses(), vec!["start"]);
}

#[tokio::test]
async fn test_progress_reports_eight_visible_steps() {
    let node = Arc::new(StubNode::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let reporter = move |progress: &Progress| {
        sink.lock()
            .unwrap()
            .push((progress.completed, progress.total, progress.step));
    };

    orchestrator(&node, settings())
        .with_progress(Arc::new(reporter))
        .run(&CancellationToken::new())
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let completed: Vec<usize> = seen.iter().map(|(c, _, _)| *c).collect();
    assert_eq!(completed, (1..=VISIBLE_STEPS).collect::<Vec<_>>());
    assert!(seen.iter().all(|(_, total, _)| *total == VISIBLE_STEPS));
    assert!(!seen.iter().any(|(_, _, step)| *step == Step::FetchDagConfig));
    assert_eq!(seen[3].2, Step::TriggerDag);
}

#[tokio::test]
async fn test_correlation_failure_starts_no_run() {
    let node = Arc::new(StubNode::new().fail_on(methods::GENERATE_CORRELATION_ID));

    let result = orchestrator(&node, settings())
        .run(&CancellationToken::new())
        .await;

    match result {
        Err(RunError::Correlation(error)) => assert_eq!(error.status, Some(500)),
        other => panic!("unexpected result: {:?}", other.map(|r| r.outcome)),
    }
    assert_eq!(node.methods(), vec![methods::GENERATE_CORRELATION_ID]);
}

#[test]
fn test_event_failure_policy_parsing() {
    assert_eq!(
        "continue".parse::<EventFailurePolicy>(),
        Ok(EventFailurePolicy::Continue)
    );
    assert_eq!(
        " ABORT ".parse::<EventFailurePolicy>(),
        Ok(EventFailurePolicy::Abort)
    );
    assert!("retry".parse::<EventFailurePolicy>().is_err());
    assert_eq!(EventFailurePolicy::default().to_string(), "continue");
}
