//! Walks through a hosted UI sign-in from the terminal.
//!
//! Set `AWS_REGION`, `COGNITO_POOL_ID`, `COGNITO_DOMAIN`, `COGNITO_CLIENT_ID`,
//! `COGNITO_CLIENT_SECRET` and `COGNITO_CALLBACK_URL`, open the printed URL, sign in,
//! then paste the full URL the browser was redirected to.
//!
//! ```sh
//! RUST_LOG=cognito_login=debug cargo run --example hosted_ui_login
//! ```

use cognito_login::prelude::*;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let key_cache = KeySetCache::from_config(&config);
    let broker = IdentityBroker::new(config, key_cache)?;

    // Stands in for the web framework's session.
    let mut session: HashMap<String, String> = HashMap::new();

    println!("Open this URL and sign in:\n\n  {}\n", broker.sign_in_url(&mut session)?);
    println!("Paste the URL you were redirected to:");

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let redirected = Url::parse(line.trim())?;
    let params = CallbackParams::from_query(redirected.query().unwrap_or_default())?;

    let identity = match broker.get_identity(&mut session, &params).await? {
        Outcome::Verified(claims) => claims,
        other => {
            error!(?other, "Sign-in failed");
            return Ok(());
        }
    };
    info!(sub = ?identity.sub(), email = ?identity.email(), "Signed in");
    println!("{}", serde_json::to_string_pretty(&identity)?);

    match broker.check_identity(identity).await? {
        Outcome::Current(_) => info!("Identity is current"),
        Outcome::Verified(_) => info!("Identity was refreshed"),
        Outcome::Rejected(reason) => error!(?reason, "Identity rejected"),
    }

    println!("\nSign out with:\n\n  {}", broker.log_out_url()?);
    Ok(())
}
