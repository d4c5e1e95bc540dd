// src/breach/client.rs
// =============================================================================
// This module asks a breach-notification service whether an address has
// shown up in a known data breach.
//
// Protocol:
//   GET {endpoint}/api/v2/breachedaccount/{address}
//   200        -> breached
//   404        -> not breached
//   429 / 503  -> rate limited, the Retry-After header says how long to wait
//   anything else -> unknown, try again
//
// The service is strict about rate limits, so every call sleeps for the
// current backoff before returning, even when it got an answer.
//
// Rust concepts:
// - async/await: Network calls and sleeps don't block the thread
// - Generics: BreachChecker<S> works with any Sleeper
// - &mut state: Backoff lives in an explicit value owned by the caller
// =============================================================================

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::BreachError;
use crate::config::BreachConfig;
use crate::email::EmailAddress;

/// How a single response was interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "code", rename_all = "snake_case")]
pub enum BreachStatus {
    Breached,
    NotBreached,
    RateLimited,
    Unknown(u16),
}

impl BreachStatus {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => BreachStatus::Breached,
            StatusCode::NOT_FOUND => BreachStatus::NotBreached,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                BreachStatus::RateLimited
            }
            other => BreachStatus::Unknown(other.as_u16()),
        }
    }

    /// Some(answer) when the status settles the question.
    pub fn verdict(&self) -> Option<bool> {
        match self {
            BreachStatus::Breached => Some(true),
            BreachStatus::NotBreached => Some(false),
            _ => None,
        }
    }
}

/// Backoff and diagnostics for checking one address.
#[derive(Debug, Clone)]
pub struct BreachCheckState {
    /// Time to sleep before the next attempt (and before returning)
    pub sleep: Duration,
    pub last_status: Option<BreachStatus>,
    pub last_error: Option<String>,
}

impl BreachCheckState {
    pub fn new(initial_sleep: Duration) -> Self {
        Self {
            sleep: initial_sleep,
            last_status: None,
            last_error: None,
        }
    }
}

/// Something that can wait. Production code uses tokio's timer.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct BreachChecker<S = TokioSleeper> {
    client: Client,
    config: BreachConfig,
    initial_sleep: Duration,
    max_retry_after: Duration,
    sleeper: S,
}

impl BreachChecker<TokioSleeper> {
    pub fn new(config: BreachConfig) -> Result<Self, BreachError> {
        Self::with_sleeper(config, TokioSleeper)
    }
}

impl<S: Sleeper> BreachChecker<S> {
    pub fn with_sleeper(config: BreachConfig, sleeper: S) -> Result<Self, BreachError> {
        let initial_sleep = config.initial_sleep().map_err(|e| {
            BreachError::InvalidConfig(format!(
                "initial_sleep_secs = {}: {}",
                config.initial_sleep_secs, e
            ))
        })?;
        let max_retry_after = config.max_retry_after().map_err(|e| {
            BreachError::InvalidConfig(format!(
                "max_retry_after_secs = {}: {}",
                config.max_retry_after_secs, e
            ))
        })?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            config,
            initial_sleep,
            max_retry_after,
            sleeper,
        })
    }

    // Checks one address with a fresh backoff state
    //
    // Returns Ok(true) if breached, Ok(false) if not.
    pub async fn check(&self, address: &EmailAddress) -> Result<bool, BreachError> {
        let mut state = BreachCheckState::new(self.initial_sleep);
        self.check_with_state(address, &mut state).await
    }

    // Checks one address, reading and updating the caller's backoff state
    //
    // Reusing a state across calls carries a server-requested Retry-After
    // over to the next address.
    pub async fn check_with_state(
        &self,
        address: &EmailAddress,
        state: &mut BreachCheckState,
    ) -> Result<bool, BreachError> {
        let url = self.account_url(address);

        for attempt in 1..=self.config.max_attempts {
            debug!("breach check {} attempt {}", address, attempt);

            let response = match self.client.get(&url).send().await {
                Ok(response) => {
                    state.last_error = None;
                    response
                }
                Err(e) => {
                    warn!("breach check {} failed: {}", address, e);
                    state.last_error = Some(e.to_string());
                    self.sleeper.sleep(state.sleep).await;
                    continue;
                }
            };

            let status = BreachStatus::from_status(response.status());
            state.last_status = Some(status.clone());

            if let Some(breached) = status.verdict() {
                self.sleeper.sleep(state.sleep).await;
                return Ok(breached);
            }

            if status == BreachStatus::RateLimited {
                // HeaderMap lookups are case-insensitive
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .filter(|secs| secs.is_finite() && *secs >= 0.0);

                if let Some(secs) = retry_after {
                    // Too large for a Duration counts as too long to wait
                    match Duration::try_from_secs_f64(secs) {
                        Ok(wait) if wait <= self.max_retry_after => state.sleep = wait,
                        _ => return Err(BreachError::Timeout { retry_after: secs }),
                    }
                }
                debug!("rate limited, backing off {:?}", state.sleep);
            } else {
                debug!("unexpected breach service status {:?}", status);
            }

            self.sleeper.sleep(state.sleep).await;
        }

        Err(BreachError::Exhausted {
            address: address.to_string(),
            last_error: state.last_error.clone(),
        })
    }

    fn account_url(&self, address: &EmailAddress) -> String {
        format!(
            "{}/api/v2/breachedaccount/{}",
            self.config.endpoint.trim_end_matches('/'),
            address
        )
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Sleeper trait instead of calling tokio::time::sleep directly?
//    - Rate-limit waits can be seconds long
//    - Tests swap in a sleeper that only records durations
//
// 2. What is `BreachChecker<S = TokioSleeper>`?
//    - A generic with a default: plain `BreachChecker` means
//      `BreachChecker<TokioSleeper>`
//
// 3. Why is the state passed in as &mut?
//    - The caller owns the backoff and can inspect it afterwards
//    - Nothing is hidden on the EmailAddress itself
// -----------------------------------------------------------------------------
