pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("storefront")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("STOREFRONT_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("api-base-url")
                .long("api-base-url")
                .help("Base URL of the storefront REST API, example: https://api.shop.tld/api/v1")
                .env("STOREFRONT_API_BASE_URL")
                .required(true),
        )
        .arg(
            Arg::new("upstream-url")
                .long("upstream-url")
                .help("Page renderer that receives every request allowed by the guard")
                .env("STOREFRONT_UPSTREAM_URL")
                .required(true),
        )
        .arg(
            Arg::new("request-timeout")
                .long("request-timeout")
                .help("Timeout in seconds for API and upstream requests")
                .default_value("10")
                .env("STOREFRONT_REQUEST_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("cookie-max-age")
                .long("cookie-max-age")
                .help("Lifetime in seconds of the session cookies")
                .default_value("604800")
                .env("STOREFRONT_COOKIE_MAX_AGE")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("cookie-secure")
                .long("cookie-secure")
                .help("Mark session cookies Secure (serve over HTTPS)")
                .env("STOREFRONT_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        );

    logging::with_args(command)
}
