use crate::{api, auth::AuthConfig, cli::actions::Action};
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            token_secret,
            public_url,
            access_ttl_seconds,
            refresh_ttl_seconds,
            verify_ttl_seconds,
            reset_ttl_seconds,
        } => {
            // Fail fast on an unusable link base instead of mailing broken URLs.
            let public_url = Url::parse(&public_url)
                .with_context(|| format!("Invalid public URL: {public_url}"))?;

            let config = AuthConfig::new(public_url.to_string())
                .with_access_ttl_seconds(access_ttl_seconds)
                .with_refresh_ttl_seconds(refresh_ttl_seconds)
                .with_verify_ttl_seconds(verify_ttl_seconds)
                .with_reset_ttl_seconds(reset_ttl_seconds);

            api::new(port, dsn, token_secret, config).await?;
        }
    }

    Ok(())
}
