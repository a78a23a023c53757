//! Owner enrichment for get-listings.
//!
//! Each listing gets one lookup against the user service. Lookups run
//! concurrently up to a bound, each under its own deadline, and results are
//! collected in the original listing order. A failed lookup only leaves its
//! own listing without a `user`; it never fails the response.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::time::Instant;

use crate::metrics::{ENRICHMENT_SKIPPED, UPSTREAM_LATENCY};
use crate::models::{Listing, UserEnvelope};
use crate::state::EnrichSettings;
use crate::upstream::{Upstream, owner_path_segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingOwner,
    Transport,
    Timeout,
    Malformed,
    Rejected,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::MissingOwner => "missing_owner",
            SkipReason::Transport => "transport",
            SkipReason::Timeout => "timeout",
            SkipReason::Malformed => "malformed",
            SkipReason::Rejected => "rejected",
        }
    }
}

async fn fetch_owner(
    client: &reqwest::Client,
    upstream: &Upstream,
    owner_id: &str,
) -> Result<Value, SkipReason> {
    let url = upstream.user_url(owner_id).ok_or(SkipReason::Transport)?;
    let start = Instant::now();
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|_| SkipReason::Transport)?;
    let body = res.bytes().await.map_err(|_| SkipReason::Transport)?;
    UPSTREAM_LATENCY
        .with_label_values(&["user"])
        .observe(start.elapsed().as_secs_f64());

    let envelope: UserEnvelope =
        serde_json::from_slice(&body).map_err(|_| SkipReason::Malformed)?;
    if !envelope.result {
        return Err(SkipReason::Rejected);
    }
    if envelope.user.is_null() {
        return Err(SkipReason::Malformed);
    }
    Ok(envelope.user)
}

pub async fn lookup_owner(
    client: &reqwest::Client,
    upstream: &Upstream,
    listing: &Listing,
    settings: EnrichSettings,
) -> Result<Value, SkipReason> {
    let owner_id = listing
        .owner_id()
        .and_then(owner_path_segment)
        .ok_or(SkipReason::MissingOwner)?;

    match tokio::time::timeout(settings.timeout, fetch_owner(client, upstream, &owner_id)).await {
        Ok(result) => result,
        Err(_) => Err(SkipReason::Timeout),
    }
}

pub async fn enrich_listings(
    client: &reqwest::Client,
    upstream: &Upstream,
    listings: Vec<Listing>,
    settings: EnrichSettings,
) -> Vec<Listing> {
    stream::iter(listings.into_iter().enumerate())
        .map(|(index, mut listing)| async move {
            // only a successful lookup may put a `user` on the record
            listing.user = None;
            match lookup_owner(client, upstream, &listing, settings).await {
                Ok(user) => listing.user = Some(user),
                Err(reason) => {
                    ENRICHMENT_SKIPPED.with_label_values(&[reason.as_str()]).inc();
                    tracing::debug!(index, reason = reason.as_str(), "listing left without owner");
                }
            }
            listing
        })
        .buffered(settings.concurrency.max(1))
        .collect()
        .await
}
