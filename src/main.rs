use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use vimeo_bridge::oembed::OEmbedClient;
use vimeo_bridge::remote::script::{bootstrap_script, render_document};
use vimeo_bridge::source::{parse_source, parse_vimeo_url};
use vimeo_bridge::{BridgeConfig, EmbedOptions};

const USAGE: &str = "usage: vimeo-bridge <html|script|oembed> <vimeo-url> [embed-options-query]";

fn main() {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    if let Err(err) = run(std::env::args().skip(1).collect()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<()> {
    let mut args = args.into_iter();
    let (Some(command), Some(url)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let options = match args.next() {
        Some(query) => EmbedOptions::from_query(&query).context("invalid embed options")?,
        None => EmbedOptions::default(),
    };
    let config = BridgeConfig::from_env().context("failed to load configuration")?;

    match command.as_str() {
        "html" => {
            let document = render_document(&parse_source(Some(&url)), &options, &config);
            println!("{}", document.html);
        }
        "script" => {
            let video = parse_vimeo_url(&url)?;
            println!(
                "{}",
                bootstrap_script(video.url(), &options, &config.container_id)
            );
        }
        "oembed" => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start runtime")?;
            let client = OEmbedClient::from_config(&config)?;
            let oembed = runtime.block_on(client.fetch(&url, Some(&options)))?;
            println!("{}", serde_json::to_string_pretty(&oembed)?);
        }
        other => bail!("unknown command `{other}`\n{USAGE}"),
    }
    Ok(())
}
