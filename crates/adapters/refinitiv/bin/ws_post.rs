// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Contributes a random-walk price to a single item on a Refinitiv gateway.
//!
//! Usage: `refinitiv-ws-post [host] [port] [user] [service] [item]`
//!
//! Missing arguments fall back to the `REFINITIV_HOST`, `REFINITIV_PORT`, `REFINITIV_USER`,
//! `REFINITIV_SERVICE` and `REFINITIV_ITEM` environment variables, then to defaults.

use std::{env, time::Duration};

use futures_util::StreamExt;
use nautilus_refinitiv::{
    common::consts::{REFINITIV_DEFAULT_HOST, REFINITIV_DEFAULT_PORT},
    config::RefinitivContributorConfig,
    websocket::{ContributionRequest, NautilusWsMessage, RefinitivWebSocketClient},
};
use rand::Rng;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_SERVICE: &str = "NIPROV";
const DEFAULT_ITEM: &str = "UMER.TST";
const FIRST_UPDATE_DELAY_SECS: u64 = 10;

fn arg_or_env(args: &[String], index: usize, var: &str, default: &str) -> String {
    args.get(index)
        .cloned()
        .or_else(|| env::var(var).ok())
        .unwrap_or_else(|| default.to_string())
}

/// Builds the log filter from `RUST_LOG` directives, defaulting to `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let directives = env::var(EnvFilter::DEFAULT_ENV).ok();
    fmt().with_env_filter(log_filter(directives.as_deref())).init();

    let args: Vec<String> = env::args().collect();
    let host = arg_or_env(&args, 1, "REFINITIV_HOST", REFINITIV_DEFAULT_HOST);
    let port: u16 = arg_or_env(
        &args,
        2,
        "REFINITIV_PORT",
        &REFINITIV_DEFAULT_PORT.to_string(),
    )
    .parse()?;
    let user = arg_or_env(&args, 3, "REFINITIV_USER", "user");
    let service = arg_or_env(&args, 4, "REFINITIV_SERVICE", DEFAULT_SERVICE);
    let item = arg_or_env(&args, 5, "REFINITIV_ITEM", DEFAULT_ITEM);

    let config = RefinitivContributorConfig::for_gateway(host, port, user);
    let mut client = RefinitivWebSocketClient::new(config);
    client.connect().await?;

    let stream = client.stream()?;
    tokio::spawn(async move {
        tokio::pin!(stream);
        while let Some(msg) = stream.next().await {
            match msg {
                NautilusWsMessage::Ack(ack) if ack.is_nak() => {
                    tracing::warn!(ack_id = ack.ack_id, nak_code = ?ack.nak_code, "post refused");
                }
                NautilusWsMessage::Ack(ack) => {
                    tracing::info!(ack_id = ack.ack_id, "post acknowledged");
                }
                NautilusWsMessage::Raw(value) => tracing::debug!(%value, "unhandled message"),
                other => tracing::info!(?other, "session event"),
            }
        }
    });

    tokio::select! {
        result = client.wait_for_login(client.login_timeout()) => {
            if let Err(e) = result {
                tracing::error!("Login failed: {e}");
                client.close().await?;
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted during login");
            client.close().await?;
            return Ok(());
        }
    }

    let mut bid = 22.1;
    let mut ask = 24.5;
    let mut trdprc = 23.3;

    let refresh = ContributionRequest::refresh(&service, &item)
        .with_field("BID", bid)
        .with_field("ASK", ask)
        .with_field("TRDPRC_1", trdprc)
        .with_field("GEN_TEXT16", "some text");
    let envelope = client.send_post(refresh).await?;
    tracing::info!(post_id = envelope.post_id, %item, "refresh posted");

    let mut delay = Duration::from_secs(FIRST_UPDATE_DELAY_SECS);
    loop {
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            reason = client.wait_for_shutdown() => {
                match reason? {
                    Some(e) => tracing::error!("Session shut down: {e}"),
                    None => tracing::info!("Session closed"),
                }
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }

        {
            let mut rng = rand::rng();
            bid = round2(bid + rng.random_range(0.3..0.5));
            trdprc = round2(bid + rng.random_range(0.2..0.5));
            ask = round2(trdprc + rng.random_range(0.6..0.9));
            delay = Duration::from_secs(rng.random_range(5..=30));
        }

        let update = ContributionRequest::update(&service, &item)
            .with_field("BID", bid)
            .with_field("ASK", ask)
            .with_field("TRDPRC_1", trdprc);

        match client.send_post(update).await {
            Ok(envelope) => tracing::info!(
                post_id = envelope.post_id,
                bid,
                ask,
                trdprc,
                next_in_secs = delay.as_secs(),
                "update posted"
            ),
            Err(e) => {
                tracing::error!("Post failed: {e}");
                break;
            }
        }
    }

    client.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[rstest]
    #[case(None, LevelFilter::INFO)]
    #[case(Some("warn"), LevelFilter::WARN)]
    #[case(Some("nautilus_refinitiv=trace"), LevelFilter::TRACE)]
    fn test_log_filter_follows_directives(
        #[case] directives: Option<&str>,
        #[case] expected: LevelFilter,
    ) {
        assert_eq!(log_filter(directives).max_level_hint(), Some(expected));
    }
}
