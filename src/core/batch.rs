//! Concurrent fan-out of rate fetches with an explicit join policy.
use crate::core::error::RateError;
use futures::future::join_all;
use std::fmt::{self, Display};
use std::future::Future;
use std::str::FromStr;
use tracing::{debug, warn};

/// How a batch reacts when some of its fetches fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Any failure fails the whole batch; no partial results.
    AllOrNothing,
    /// Failures become `None` placeholders and the batch carries on.
    BestEffort,
}

impl Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                JoinPolicy::AllOrNothing => "all-or-nothing",
                JoinPolicy::BestEffort => "best-effort",
            }
        )
    }
}

impl FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all-or-nothing" | "strict" => Ok(JoinPolicy::AllOrNothing),
            "best-effort" | "tolerant" => Ok(JoinPolicy::BestEffort),
            _ => Err(format!("Invalid join policy: {s}")),
        }
    }
}

/// Result slot of one identifier in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem<I, T> {
    pub identifier: I,
    pub value: Option<T>,
}

/// Runs `op` for every identifier concurrently and waits for all of them.
///
/// Results come back in the order of `identifiers`, not completion order.
/// Under [`JoinPolicy::AllOrNothing`] the first failure (in input order) is
/// returned once every operation has finished.
pub async fn fetch_all<I, T, F, Fut>(
    identifiers: &[I],
    policy: JoinPolicy,
    op: F,
) -> Result<Vec<BatchItem<I, T>>, RateError>
where
    I: Clone + Display,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, RateError>>,
{
    debug!(count = identifiers.len(), %policy, "Dispatching batch");

    let futures = identifiers.iter().map(|id| {
        let fut = op(id.clone());
        async move { (id.clone(), fut.await) }
    });
    let results = join_all(futures).await;

    let mut items = Vec::with_capacity(results.len());
    for (identifier, result) in results {
        let value = match (result, policy) {
            (Ok(value), _) => Some(value),
            (Err(e), JoinPolicy::AllOrNothing) => return Err(e),
            (Err(e), JoinPolicy::BestEffort) => {
                warn!(%identifier, error = %e, "Fetch failed, continuing without it");
                None
            }
        };
        items.push(BatchItem { identifier, value });
    }

    Ok(items)
}
