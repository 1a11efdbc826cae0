use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

fn required_url(matches: &clap::ArgMatches, name: &str) -> Result<Url> {
    let raw = matches
        .get_one::<String>(name)
        .with_context(|| format!("missing required argument: --{name}"))?;
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid --{name}: {raw}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => anyhow::bail!("invalid --{name}: unsupported scheme {scheme}"),
    }
}

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let api_base_url = required_url(matches, "api-base-url")?;
    let upstream_url = required_url(matches, "upstream-url")?;
    let request_timeout = Duration::from_secs(
        matches
            .get_one::<u64>("request-timeout")
            .copied()
            .unwrap_or(10),
    );
    let cookie_max_age = matches
        .get_one::<u64>("cookie-max-age")
        .copied()
        .unwrap_or(crate::session::DEFAULT_MAX_AGE_SECONDS);
    let cookie_secure = matches.get_flag("cookie-secure");

    Ok(Action::Server(Args {
        port,
        api_base_url,
        upstream_url,
        request_timeout,
        cookie_max_age,
        cookie_secure,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn dispatch(args: &[&str]) -> Result<Action> {
        let matches = commands::new().try_get_matches_from(args)?;
        handler(&matches)
    }

    #[test]
    fn builds_server_action() -> Result<()> {
        let Action::Server(args) = dispatch(&[
            "storefront",
            "--port",
            "9000",
            "--api-base-url",
            "https://api.shop.tld/api/v1",
            "--upstream-url",
            "http://127.0.0.1:3000",
            "--request-timeout",
            "4",
        ])?;

        assert_eq!(args.port, 9000);
        assert_eq!(args.api_base_url.as_str(), "https://api.shop.tld/api/v1");
        assert_eq!(args.upstream_url.host_str(), Some("127.0.0.1"));
        assert_eq!(args.request_timeout, Duration::from_secs(4));
        Ok(())
    }

    #[test]
    fn rejects_invalid_urls() {
        assert!(dispatch(&[
            "storefront",
            "--api-base-url",
            "not a url",
            "--upstream-url",
            "http://127.0.0.1:3000",
        ])
        .is_err());
        assert!(dispatch(&[
            "storefront",
            "--api-base-url",
            "https://api.shop.tld",
            "--upstream-url",
            "ftp://renderer",
        ])
        .is_err());
    }
}
