//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use roster_fetch::cache::{CacheLayer, MemoryStore};
use roster_fetch::config::RosterConfig;
use roster_fetch::roster::{
    DirectoryError, DirectoryResult, Member, MemberId, MemberSet, RosterDirectory, RosterPage,
};
use roster_fetch::RosterService;

/// In-process directory with scripted failures and latency.
///
/// Members are `m0000`, `m0001`, ... and every tenth holds the `mod` role.
pub struct MockDirectory {
    members: Vec<Member>,
    indexed: AtomicBool,
    failing: AtomicBool,
    delay_ms: AtomicU64,
    pub page_calls: AtomicU32,
    pub index_calls: AtomicU32,
}

impl MockDirectory {
    pub fn with_members(count: usize) -> Arc<Self> {
        let members = (0..count)
            .map(|i| {
                let member = Member::new(format!("m{i:04}"), format!("Member {i}"));
                if i % 10 == 0 {
                    member.with_role("mod")
                } else {
                    member
                }
            })
            .collect();

        Arc::new(Self {
            members,
            indexed: AtomicBool::new(false),
            failing: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            page_calls: AtomicU32::new(0),
            index_calls: AtomicU32::new(0),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_indexed(&self, indexed: bool) {
        self.indexed.store(indexed, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn live_calls(&self) -> u32 {
        self.page_calls.load(Ordering::SeqCst) + self.index_calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self) -> DirectoryResult<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DirectoryError::Status(503));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterDirectory for MockDirectory {
    async fn fetch_page(
        &self,
        _partition: &str,
        cursor: Option<&MemberId>,
        limit: usize,
    ) -> DirectoryResult<RosterPage> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let start = match cursor {
            Some(after) => self
                .members
                .iter()
                .position(|m| &m.id == after)
                .map_or(self.members.len(), |i| i + 1),
            None => 0,
        };
        let end = (start + limit).min(self.members.len());
        let members = self.members[start..end].to_vec();
        let next_cursor = if end < self.members.len() {
            members.last().map(|m| m.id.clone())
        } else {
            None
        };
        Ok(RosterPage {
            members,
            next_cursor,
        })
    }

    async fn fetch_by_filter_direct(
        &self,
        _partition: &str,
        filter: Option<&str>,
    ) -> DirectoryResult<Option<MemberSet>> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        if !self.indexed.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let all: MemberSet = self.members.iter().cloned().collect();
        Ok(Some(all.filtered(filter)))
    }
}

/// A service over `directory` and a fresh memory store, plus a cache layer
/// sharing that store for seeding and inspection.
pub fn service_with(
    config: &RosterConfig,
    directory: Arc<MockDirectory>,
) -> (RosterService, CacheLayer) {
    let store = Arc::new(MemoryStore::new());
    let cache = CacheLayer::new(store.clone(), config.cache.clone());
    let service = RosterService::new(config, directory, store);
    (service, cache)
}

/// `count` members for seeding the cache.
pub fn member_set(count: usize, prefix: &str) -> MemberSet {
    (0..count)
        .map(|i| Member::new(format!("{prefix}{i:04}"), format!("Seeded {i}")))
        .collect()
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` receives the request target (path and query) and returns the status
/// code and JSON body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut read = 0;
                        loop {
                            match socket.read(&mut buf[read..]).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    read += n;
                                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n")
                                        || read == buf.len()
                                    {
                                        break;
                                    }
                                }
                            }
                        }

                        let head = String::from_utf8_lossy(&buf[..read]);
                        let target = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        let (status, body) = f(target).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
