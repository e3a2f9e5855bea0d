//! HTTP directory client against a programmable backend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use roster_fetch::config::{DirectoryConfig, RetryConfig};
use roster_fetch::fetch::{paginate, PaginationPlan};
use roster_fetch::roster::{DirectoryError, HttpDirectory, MemberId, RosterDirectory};
use serde_json::json;

mod common;

fn member(i: usize) -> serde_json::Value {
    let roles: Vec<&str> = if i % 2 == 0 { vec!["mod"] } else { vec![] };
    json!({ "id": format!("m{i}"), "display_name": format!("Member {i}"), "roles": roles })
}

fn query_param(target: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(&format!("http://backend{target}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn client(addr: std::net::SocketAddr) -> HttpDirectory {
    let config = DirectoryConfig {
        base_url: format!("http://{addr}/v1"),
        ..DirectoryConfig::default()
    };
    let retries = RetryConfig {
        max_attempts: 3,
        base_delay_ms: 10,
        max_delay_ms: 50,
    };
    HttpDirectory::new(&config, retries).unwrap()
}

#[tokio::test]
async fn test_pagination_follows_cursor() {
    let targets = Arc::new(Mutex::new(Vec::new()));
    let seen = targets.clone();
    let addr = common::start_programmable_backend(move |target| {
        seen.lock().unwrap().push(target.clone());
        async move {
            let limit: usize = query_param(&target, "limit")
                .and_then(|l| l.parse().ok())
                .unwrap_or(0);
            let start = query_param(&target, "after")
                .and_then(|a| a.trim_start_matches('m').parse::<usize>().ok())
                .map_or(0, |i| i + 1);
            let end = (start + limit).min(5);
            let members: Vec<_> = (start..end).map(member).collect();
            let next = if end < 5 { Some(format!("m{}", end - 1)) } else { None };
            (200, json!({ "members": members, "next_cursor": next }).to_string())
        }
    })
    .await;

    let directory = client(addr);
    let members = paginate(&directory, "guild-1", PaginationPlan::capped(2, 100))
        .await
        .unwrap();

    assert_eq!(members.len(), 5);
    assert!(members.contains(&MemberId::from("m4")));

    let targets = targets.lock().unwrap();
    assert_eq!(targets.len(), 3);
    assert!(targets[0].starts_with("/v1/partitions/guild-1/members?limit=2"));
    assert!(targets[1].ends_with("after=m1"));
    assert!(targets[2].ends_with("after=m3"));
}

#[tokio::test]
async fn test_unindexed_partition_is_absent() {
    let addr = common::start_programmable_backend(|_target| async { (404, "{}".to_string()) }).await;

    let result = client(addr)
        .fetch_by_filter_direct("guild-1", Some("mod"))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_index_lookup_passes_role() {
    let addr = common::start_programmable_backend(|target| async move {
        assert!(target.starts_with("/v1/partitions/guild-1/index"));
        assert_eq!(query_param(&target, "role").as_deref(), Some("mod"));
        let members: Vec<_> = [0, 2, 4].into_iter().map(member).collect();
        (200, serde_json::Value::from(members).to_string())
    })
    .await;

    let members = client(addr)
        .fetch_by_filter_direct("guild-1", Some("mod"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(members.len(), 3);
    assert!(members.iter().all(|m| m.has_role("mod")));
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_programmable_backend(move |_target| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt < 2 {
                (429, "{}".to_string())
            } else {
                (200, json!({ "members": [member(0)], "next_cursor": null }).to_string())
            }
        }
    })
    .await;

    let page = client(addr).fetch_page("guild-1", None, 10).await.unwrap();

    assert_eq!(page.members.len(), 1);
    assert!(page.next_cursor.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_persistent_outage_exhausts_retries() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_programmable_backend(move |_target| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { (503, "{}".to_string()) }
    })
    .await;

    let err = client(addr).fetch_page("guild-1", None, 10).await.unwrap_err();

    match err {
        DirectoryError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, DirectoryError::Status(503)));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_programmable_backend(move |_target| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { (400, "{}".to_string()) }
    })
    .await;

    let err = client(addr).fetch_page("guild-1", None, 10).await.unwrap_err();

    assert!(matches!(err, DirectoryError::Status(400)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
