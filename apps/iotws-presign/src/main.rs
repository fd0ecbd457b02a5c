//! iotws-presign - print a presigned AWS IoT WebSocket URL.
//!
//! Signs the MQTT-over-WebSocket handshake for the configured endpoint with
//! the current UTC time and prints the resulting `wss://` URL, ready to hand
//! to any WebSocket client that speaks the `mqtt` subprotocol.
//!
//! # Usage
//!
//! ```text
//! AWS_IOT_ENDPOINT=A2MBBEONHC9LUG AWS_IOT_REGION=us-east-1 \
//! AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=... iotws-presign
//!
//! iotws-presign --verify '/mqtt?X-Amz-Algorithm=...'
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_IOT_ENDPOINT` | *(required unless `AWS_IOT_HOST`)* | Account endpoint prefix |
//! | `AWS_IOT_REGION` | `us-east-1` | Region |
//! | `AWS_IOT_HOST` | *(derived)* | Explicit broker host |
//! | `AWS_IOT_PORT` | `443` | Broker port |
//! | `AWS_ACCESS_KEY_ID` | *(required)* | IAM access key id |
//! | `AWS_SECRET_ACCESS_KEY` | *(required)* | IAM secret key |
//! | `PRESIGN_FORMAT` | `url` | `url` or `json` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result, bail};
use iotws_auth::{ConnectionIdentity, PresignedParams, RequestSigner, SystemClock, verify_presigned_path};
use iotws_core::IotConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber on stderr, keeping stdout for the URL.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// How the result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Url,
    Json,
}

impl OutputFormat {
    fn from_env() -> Result<Self> {
        match std::env::var("PRESIGN_FORMAT").as_deref() {
            Err(_) | Ok("" | "url") => Ok(Self::Url),
            Ok("json") => Ok(Self::Json),
            Ok(other) => bail!("unsupported PRESIGN_FORMAT: {other} (expected url or json)"),
        }
    }
}

fn render(format: OutputFormat, url: &str, params: &PresignedParams) -> Result<String> {
    match format {
        OutputFormat::Url => Ok(url.to_owned()),
        OutputFormat::Json => {
            let expires_at = params.expires_at().context("computing expiry")?;
            let doc = serde_json::json!({
                "url": url,
                "expiresAt": expires_at.to_rfc3339(),
                "params": params,
            });
            serde_json::to_string_pretty(&doc).context("encoding JSON output")
        }
    }
}

fn main() -> Result<()> {
    let config = IotConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level)?;
    debug!(?config, "Loaded configuration");

    let identity = ConnectionIdentity::try_from(&config).context("building connection identity")?;
    let format = OutputFormat::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(pos) = args.iter().position(|a| a == "--verify") {
        let path = args
            .get(pos + 1)
            .context("--verify needs a signed path argument")?;
        let params = verify_presigned_path(&identity, path).context("verifying signed path")?;
        info!(signed_at = %params.timestamp, "Signed path verified");
        let url = format!("wss://{}{path}", identity.host);
        println!("{}", render(format, &url, &params)?);
        return Ok(());
    }

    let mut signer = RequestSigner::new(SystemClock);
    let url = signer
        .sign_url(&identity)
        .context("signing handshake")?;
    info!(host = %identity.host, port = identity.port, "Signed handshake URL");

    let path = url
        .strip_prefix(&format!("wss://{}", identity.host))
        .context("signed URL does not start with the broker host")?;
    let params = PresignedParams::parse(path).context("parsing signed path")?;
    println!("{}", render(format, &url, &params)?);
    Ok(())
}
