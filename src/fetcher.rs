use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tracing::{info, warn};

const CONCURRENCY: usize = 3;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const USER_AGENT: &str = concat!("ifa_scraper/", env!("CARGO_PKG_VERSION"));

/// Raw response for one start URL.
pub struct FetchedDocument {
    pub url: String,
    pub status: Option<u16>,
    pub body: Option<Vec<u8>>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(60))
        .build()?)
}

/// Fetch every URL concurrently. Results come back in completion order.
pub async fn fetch_all(urls: Vec<String>) -> Result<Vec<FetchedDocument>> {
    let client = client()?;
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = urls.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchedDocument>(CONCURRENCY * 2);

    for url in urls {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = match sem.acquire().await {
                Ok(p) => p,
                Err(_) => return,
            };
            let doc = fetch_with_retry(&client, &url, Duration::from_millis(BASE_BACKOFF_MS)).await;
            let _ = tx.send(doc).await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut docs = Vec::with_capacity(total);
    while let Some(doc) = rx.recv().await {
        if let Some(e) = &doc.error {
            warn!("Fetch failed for {}: {}", doc.url, e);
        }
        pb.set_message(doc.url.clone());
        pb.inc(1);
        docs.push(doc);
    }

    pb.finish_and_clear();
    let errors = docs.iter().filter(|d| d.error.is_some()).count();
    info!("Fetched {} documents ({} ok, {} errors)", total, total - errors, errors);

    Ok(docs)
}

/// One initial request plus up to `MAX_RETRIES` retries on 429/5xx.
async fn fetch_with_retry(client: &Client, url: &str, base_backoff: Duration) -> FetchedDocument {
    let mut retries = 0;
    loop {
        let doc = fetch_one(client, url).await;
        if !is_retryable(doc.status) || retries == MAX_RETRIES {
            return doc;
        }

        let backoff = base_backoff * 2u32.pow(retries);
        retries += 1;
        warn!(
            "HTTP {} on {} (retry {}/{}), backing off {:.1}s",
            doc.status.unwrap_or_default(),
            url,
            retries,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }
}

fn is_retryable(status: Option<u16>) -> bool {
    matches!(
        status.and_then(|s| StatusCode::from_u16(s).ok()),
        Some(s) if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error()
    )
}

/// Single GET. Non-2xx statuses are reported in `error`, never as `Err`.
pub async fn fetch_one(client: &Client, url: &str) -> FetchedDocument {
    let start = Instant::now();
    let result = async {
        let resp = client.get(url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        Ok::<_, reqwest::Error>((status, body))
    }
    .await;
    let elapsed = start.elapsed().as_millis() as i64;

    match result {
        Ok((status, body)) if status.is_success() => FetchedDocument {
            url: url.to_string(),
            status: Some(status.as_u16()),
            body: Some(body.to_vec()),
            error: None,
            latency_ms: Some(elapsed),
        },
        Ok((status, _)) => FetchedDocument {
            url: url.to_string(),
            status: Some(status.as_u16()),
            body: None,
            error: Some(format!("HTTP {}", status)),
            latency_ms: Some(elapsed),
        },
        Err(e) => FetchedDocument {
            url: url.to_string(),
            status: None,
            body: None,
            error: Some(e.to_string()),
            latency_ms: Some(elapsed),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local server answering every request with `status`; returns its URL and a hit counter.
    async fn serve(status: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let resp = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status
                );
                let _ = socket.write_all(resp.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/schedule.pdf", addr), hits)
    }

    fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(Some(429)));
        assert!(is_retryable(Some(503)));
        assert!(!is_retryable(Some(404)));
        assert!(!is_retryable(Some(200)));
        assert!(!is_retryable(None));
    }

    #[tokio::test]
    async fn server_errors_stop_after_max_retries() {
        let (url, hits) = serve("503 Service Unavailable").await;
        let doc = fetch_with_retry(&local_client(), &url, Duration::from_millis(1)).await;

        assert_eq!(doc.status, Some(503));
        assert!(doc.body.is_none());
        assert_eq!(doc.error.as_deref(), Some("HTTP 503 Service Unavailable"));
        assert_eq!(hits.load(Ordering::SeqCst), 1 + MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (url, hits) = serve("404 Not Found").await;
        let doc = fetch_with_retry(&local_client(), &url, Duration::from_millis(1)).await;

        assert_eq!(doc.status, Some(404));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
