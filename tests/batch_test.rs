mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{test_config, FakeFactory, PortalData, RecordingNotifier};
use solon_lookup::models::SearchRequest;
use solon_lookup::config::Config;
use solon_lookup::orchestrator::{search_once, BatchScheduler};
use solon_lookup::services::Notifier;
use solon_lookup::workflow::SearchFlow;
use solon_lookup::SearchOutcome;
use tokio_test::assert_ok;

fn requests(count: usize) -> Vec<SearchRequest> {
    (0..count)
        .map(|i| {
            if i % 3 == 0 {
                SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", "2025").with_client(format!("client {}", i))
            } else {
                SearchRequest::new("Ειρηνοδικείο Πειραιά", (1000 + i).to_string(), "2024")
            }
        })
        .collect()
}

async fn run_batch(factory: Arc<FakeFactory>, workers: usize, count: usize) -> Vec<SearchOutcome> {
    let config = test_config(workers);
    let flow = SearchFlow::new(&config);
    let scheduler = BatchScheduler::new(factory, config, flow);
    scheduler.run_all(requests(count)).await
}

fn indices(outcomes: &[SearchOutcome]) -> Vec<usize> {
    let mut indices: Vec<usize> = outcomes.iter().filter_map(|o| o.index).collect();
    indices.sort_unstable();
    indices
}

#[tokio::test]
async fn test_every_request_yields_exactly_one_outcome() {
    for workers in [1, 2, 3, 5] {
        let factory = Arc::new(FakeFactory::new(PortalData::sample(), test_config(workers)));
        let outcomes = run_batch(factory.clone(), workers, 7).await;

        assert_eq!(outcomes.len(), 7, "workers = {}", workers);
        assert_eq!(indices(&outcomes), (0..7).collect::<Vec<_>>());
        assert!(outcomes.iter().all(|o| o.ok), "workers = {}: {:?}", workers, outcomes);

        // 每个 worker 打开一次，也关闭一次
        assert_eq!(factory.opens(), workers);
        assert_eq!(factory.closes(), workers);
    }
}

#[tokio::test]
async fn test_outcomes_carry_results_for_their_index() {
    let factory = Arc::new(FakeFactory::new(PortalData::sample(), test_config(2)));
    let outcomes = run_batch(factory, 2, 6).await;

    for outcome in &outcomes {
        let index = outcome.index.unwrap();
        if index % 3 == 0 {
            assert_eq!(outcome.result.as_deref(), Some("ΑΠΟΡΡΙΠΤΙΚΗ 123/2025"));
        } else {
            // 门户显示"没有数据"：成功但结果为空
            assert_eq!(outcome.result.as_deref(), Some(""));
        }
    }
}

#[tokio::test]
async fn test_failed_workers_leave_jobs_to_the_others() {
    let mut factory = FakeFactory::new(PortalData::sample(), test_config(3));
    factory.failing_workers = vec![1, 3];
    let factory = Arc::new(factory);

    let outcomes = run_batch(factory.clone(), 3, 5).await;
    assert_eq!(indices(&outcomes), vec![0, 1, 2, 3, 4]);
    assert!(outcomes.iter().all(|o| o.ok));
    assert_eq!(factory.opens(), 1);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_leftover_jobs_become_failures_when_no_session_opens() {
    let mut factory = FakeFactory::new(PortalData::sample(), test_config(2));
    factory.failing_workers = vec![1, 2];
    let factory = Arc::new(factory);

    let outcomes = run_batch(factory, 2, 4).await;
    assert_eq!(indices(&outcomes), vec![0, 1, 2, 3]);
    assert!(outcomes.iter().all(|o| !o.ok && o.error.is_some()));
}

#[tokio::test]
async fn test_prepare_failure_closes_the_page() {
    let mut factory = FakeFactory::new(PortalData::sample(), test_config(2));
    factory.fail_navigation = true;
    let factory = Arc::new(factory);

    let outcomes = run_batch(factory.clone(), 2, 3).await;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| !o.ok));
    assert_eq!(factory.opens(), 2);
    assert_eq!(factory.closes(), 2);
}

#[tokio::test]
async fn test_bad_requests_fail_individually() {
    let factory = Arc::new(FakeFactory::new(PortalData::sample(), test_config(2)));
    let config = test_config(2);
    let scheduler = BatchScheduler::new(factory, config.clone(), SearchFlow::new(&config));

    let outcomes = scheduler
        .run_all(vec![
            SearchRequest::new("ΕΦΕΤΕΙΟ ΚΡΗΤΗΣ", "1", "2024"),
            SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "", "2024"),
            SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", "2025"),
        ])
        .await;

    let by_index = |i: usize| outcomes.iter().find(|o| o.index == Some(i)).unwrap();
    assert!(by_index(0).error.as_deref().unwrap().contains("ΕΦΕΤΕΙΟ ΚΡΗΤΗΣ"));
    assert!(!by_index(1).ok);
    assert!(by_index(2).ok);

    let distinct: HashSet<_> = outcomes.iter().map(|o| o.index).collect();
    assert_eq!(distinct.len(), 3);
}

#[tokio::test]
async fn test_single_search_opens_and_closes_one_session() {
    let config = test_config(1);
    let factory = FakeFactory::new(PortalData::sample(), config.clone());
    let flow = SearchFlow::new(&config);

    let request = SearchRequest::new("πρωτοδικειο αθηνων", "70927", "2025");
    let outcome = search_once(&factory, config.clone(), &flow, &request).await;

    assert!(outcome.ok);
    assert_eq!(outcome.result.as_deref(), Some("ΑΠΟΡΡΙΠΤΙΚΗ 123/2025"));
    assert_eq!(outcome.index, None);
    assert_eq!(factory.opens(), 1);
    assert_eq!(factory.closes(), 1);

    // 缺少字段：不启动浏览器
    let invalid = SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", "");
    let outcome = search_once(&factory, config, &flow, &invalid).await;
    assert!(!outcome.ok);
    assert_eq!(factory.opens(), 1);
}

#[tokio::test]
async fn test_serialized_outcome_keys() {
    let config = test_config(1);
    let factory = FakeFactory::new(PortalData::sample(), config.clone());
    let flow = SearchFlow::new(&config);
    let request = SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", "2025");

    let outcome = search_once(&factory, config, &flow, &request).await;
    let json = assert_ok!(serde_json::to_value(&outcome));
    assert_eq!(json["ok"], true);
    assert_eq!(json["result"], "ΑΠΟΡΡΙΠΤΙΚΗ 123/2025");
}

fn mixed_requests() -> Vec<SearchRequest> {
    vec![
        SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", "2025").with_client("client"),
        SearchRequest::new("ΕΙΡΗΝΟΔΙΚΕΙΟ ΠΕΙΡΑΙΑ", "5", "2024").with_client("client"),
        SearchRequest::new("ΕΦΕΤΕΙΟ ΚΡΗΤΗΣ", "1", "2024").with_client("client"),
    ]
}

#[tokio::test]
async fn test_only_meaningful_results_are_notified() {
    let config = test_config(2);
    let factory = Arc::new(FakeFactory::new(PortalData::sample(), config.clone()));
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = SearchFlow::new(&config).with_notifier(Some(notifier.clone() as Arc<dyn Notifier>));
    let scheduler = BatchScheduler::new(factory, config, flow);

    let outcomes = scheduler.run_all(mixed_requests()).await;
    let by_index = |i: usize| outcomes.iter().find(|o| o.index == Some(i)).unwrap();

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let (subject, body) = &sent[0];
    assert_eq!(subject, "ΣΟΛΩΝ • client • ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ • ΓΑΚ 70927/2025");
    assert!(body.contains("Γ.Α.Κ.: 70927"));
    assert!(body.contains("ΑΠΟΡΡΙΠΤΙΚΗ 123/2025"));

    // 状态原样记录，只出现在有结果的那条上
    assert_eq!(by_index(0).notification_status.as_deref(), Some("notification ok"));
    assert!(by_index(1).ok);
    assert_eq!(by_index(1).result.as_deref(), Some(""));
    assert_eq!(by_index(1).notification_status, None);
    assert!(!by_index(2).ok);
    assert_eq!(by_index(2).notification_status, None);
}

#[tokio::test]
async fn test_stalled_notifier_does_not_hold_the_batch() {
    let config = Arc::new(Config {
        notify_timeout_ms: 100,
        ..(*test_config(1)).clone()
    });
    let factory = Arc::new(FakeFactory::new(PortalData::sample(), config.clone()));
    let notifier = Arc::new(RecordingNotifier::stalled());
    let flow = SearchFlow::new(&config).with_notifier(Some(notifier.clone() as Arc<dyn Notifier>));
    let scheduler = BatchScheduler::new(factory, config, flow);

    let outcomes = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        scheduler.run_all(mixed_requests()),
    )
    .await
    .expect("批量查询不应被通知卡住");

    assert_eq!(outcomes.len(), 3);
    assert_eq!(notifier.sent().len(), 1);
    let matched = outcomes.iter().find(|o| o.index == Some(0)).unwrap();
    assert!(matched.ok);
    assert!(matched
        .notification_status
        .as_deref()
        .unwrap()
        .starts_with("notification failed: timed out"));
}
