use std::{env, time::Duration};

use anyhow::{Context, Result};
use dashboard::{SortSpec, DEFAULT_POLL_INTERVAL};

const DEFAULT_UPSTREAM_URL: &str = "https://stocksapi-qp3k.onrender.com";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub frontend_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let upstream_url = env::var("UPSTREAM_PORTFOLIO_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8081".to_string())
                .parse()
                .context("PORT must be a valid u16")?,
            upstream_url,
            upstream_timeout: parse_duration_seconds("UPSTREAM_TIMEOUT_SECS", 15),
            frontend_origins: parse_origins(),
        })
    }
}

/// Settings for the terminal dashboard that polls the passthrough endpoint.
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub api_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub sort: Option<SortSpec>,
    pub sector: Option<String>,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        let sort = non_empty_var("DASHBOARD_SORT")
            .map(|raw| {
                raw.parse::<SortSpec>()
                    .with_context(|| format!("invalid DASHBOARD_SORT value {raw}"))
            })
            .transpose()?;

        Ok(Self {
            api_url: non_empty_var("DASHBOARD_API_URL")
                .unwrap_or_else(|| "http://localhost:8081/api/portfolio".to_string()),
            poll_interval: parse_duration_seconds(
                "DASHBOARD_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL.as_secs(),
            ),
            request_timeout: parse_duration_seconds("DASHBOARD_REQUEST_TIMEOUT_SECS", 15),
            sort,
            sector: non_empty_var("DASHBOARD_SECTOR"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_origins() -> Vec<String> {
    if let Ok(list) = env::var("FRONTEND_ORIGINS") {
        split_origins(&list)
    } else if let Ok(origin) = env::var("FRONTEND_ORIGIN") {
        split_origins(&origin)
    } else {
        vec!["http://localhost:3000".to_string()]
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|item| {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_duration_seconds(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}
