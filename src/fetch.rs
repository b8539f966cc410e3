use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Proxy, StatusCode};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Settings;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const BASE_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF_MS: u64 = 60_000;

/// Story page HTML for one username.
pub struct FetchedPage {
    pub username: String,
    pub html: String,
}

/// Public story page for a username.
pub fn story_url(base_url: &str, username: &str) -> String {
    format!("{}/@{}", base_url.trim_end_matches('/'), username)
}

pub fn build_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(settings.request_timeout_seconds))
        .danger_accept_invalid_certs(!settings.verify_ssl);

    for (scheme, url) in settings.proxies.iter().flatten() {
        let proxy = match scheme.as_str() {
            "http" => Proxy::http(url),
            "https" => Proxy::https(url),
            "all" => Proxy::all(url),
            other => {
                warn!("Ignoring proxy for unknown scheme '{}'", other);
                continue;
            }
        }
        .with_context(|| format!("Invalid {} proxy URL '{}'", scheme, url))?;
        builder = builder.proxy(proxy);
    }

    builder.build().context("Failed to build HTTP client")
}

/// Fetch story pages concurrently. Usernames whose fetch fails are logged
/// and left out; the rest come back in input order.
pub async fn fetch_story_pages(
    settings: &Settings,
    usernames: &[String],
) -> Result<Vec<FetchedPage>> {
    let client = build_client(settings)?;
    let concurrency = settings.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = usernames.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Workers send (input position, username, outcome); main loop collects.
    let (tx, mut rx) =
        tokio::sync::mpsc::channel::<(usize, String, Result<String>)>(concurrency * 2);

    for (idx, username) in usernames.iter().enumerate() {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let url = story_url(&settings.snapchat_base_url, username);
        let username = username.clone();
        let max_retries = settings.max_retries;

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            info!("Fetching stories page for username '{}' ...", username);
            let outcome = fetch_with_retry(&client, &url, &username, max_retries).await;
            let _ = tx.send((idx, username, outcome)).await;
        });
    }

    drop(tx);

    let mut fetched = Vec::with_capacity(total);
    while let Some((idx, username, outcome)) = rx.recv().await {
        match outcome {
            Ok(html) => fetched.push((idx, FetchedPage { username, html })),
            Err(e) => error!("Failed to fetch stories for '{}': {:#}", username, e),
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} of {} story pages", fetched.len(), total);

    fetched.sort_by_key(|(idx, _)| *idx);
    Ok(fetched.into_iter().map(|(_, page)| page).collect())
}

async fn fetch_with_retry(
    client: &Client,
    url: &str,
    username: &str,
    max_retries: u32,
) -> Result<String> {
    let mut attempt = 0;
    loop {
        match fetch_one(client, url).await {
            Ok(html) => return Ok(html),
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                let backoff = backoff_for(attempt);
                warn!(
                    "Fetch for {} failed ({}), attempt {}/{}, backing off {:.1}s",
                    username,
                    e,
                    attempt + 1,
                    max_retries,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("GET {}", url)),
        }
    }
}

async fn fetch_one(client: &Client, url: &str) -> reqwest::Result<String> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Exponential backoff for the given zero-based attempt, capped at a minute.
fn backoff_for(attempt: u32) -> Duration {
    let ms = BASE_BACKOFF_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

fn is_retryable(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    err.status().is_some_and(should_retry_status)
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
