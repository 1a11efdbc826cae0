use crate::{
    api::ApiClient,
    cli::telemetry,
    server::{self, AppState, Upstream},
    session::CookiePolicy,
};
use anyhow::Result;
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub api_base_url: Url,
    pub upstream_url: Url,
    pub request_timeout: Duration,
    pub cookie_max_age: u64,
    pub cookie_secure: bool,
}

impl Args {
    fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy::new()
            .with_max_age_seconds(self.cookie_max_age)
            .with_secure(self.cookie_secure)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the clients cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let api = ApiClient::new(args.api_base_url.as_str(), args.request_timeout)?;
    let upstream = Upstream::new(args.upstream_url.as_str(), args.request_timeout)?;
    let state = AppState::new(api, upstream, args.cookie_policy());

    let result = server::new(args.port, state).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("api_base_url", args.api_base_url.to_string()),
        ("upstream_url", args.upstream_url.to_string()),
        (
            "request_timeout",
            format!("{}s", args.request_timeout.as_secs()),
        ),
        ("cookie_max_age", format!("{}s", args.cookie_max_age)),
        ("cookie_secure", args.cookie_secure.to_string()),
    ];
    info!("{}", startup_message(&entries));
}

fn startup_message(entries: &[(&str, String)]) -> String {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    message
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
