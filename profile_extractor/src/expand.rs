//! Expansion stage
//!
//! Live pages often hide part of their data behind "show more" controls.
//! [`expand`] clicks through them before extraction, one at a time, waiting
//! for the page to settle after each click. The loop is capped so that a
//! control that never goes away cannot keep it running forever.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ExpansionError};

/// A live document that can reveal more content on request
#[async_trait]
pub trait Expandable: Send {
    /// Activate the next reveal-more control.
    ///
    /// Returns `Ok(true)` if a control was found and activated, `Ok(false)`
    /// when none is left.
    async fn reveal_more(&mut self) -> Result<bool, ExpansionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Upper bound on activations per expansion
    pub max_iterations: u32,
    /// Wait after each activation so the page can re-render (milliseconds)
    pub settle_delay_ms: u64,
    /// Overall deadline applied by [`expand_within`] (milliseconds)
    pub deadline_ms: Option<u64>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            settle_delay_ms: 1000,
            deadline_ms: None,
        }
    }
}

impl ExpansionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "expansion.max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.deadline_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "expansion.deadline_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Why the expansion loop ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No reveal-more control left
    Exhausted,
    IterationCap,
    /// A trigger failed; treated as "no further control"
    Fault(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpansionOutcome {
    pub activations: u32,
    pub stop: StopReason,
}

/// Reveal hidden content, strictly one control at a time
pub async fn expand<E>(target: &mut E, config: &ExpansionConfig) -> ExpansionOutcome
where
    E: Expandable + ?Sized,
{
    let mut activations = 0;
    while activations < config.max_iterations {
        match target.reveal_more().await {
            Ok(true) => {
                activations += 1;
                debug!(activations, "revealed more content");
                tokio::time::sleep(config.settle_delay()).await;
            }
            Ok(false) => {
                return ExpansionOutcome {
                    activations,
                    stop: StopReason::Exhausted,
                };
            }
            Err(e) => {
                warn!(activations, error = %e, "reveal control failed, ending expansion");
                return ExpansionOutcome {
                    activations,
                    stop: StopReason::Fault(e.to_string()),
                };
            }
        }
    }

    debug!(activations, "expansion reached iteration cap");
    ExpansionOutcome {
        activations,
        stop: StopReason::IterationCap,
    }
}

/// Run [`expand`] against a deadline, or `config.deadline_ms` when `deadline`
/// is `None`. Without either it runs unbounded.
///
/// `None` means the deadline won and the expansion future was dropped at its
/// current suspension point.
pub async fn expand_within<E>(
    target: &mut E,
    config: &ExpansionConfig,
    deadline: Option<Duration>,
) -> Option<ExpansionOutcome>
where
    E: Expandable + ?Sized,
{
    let Some(deadline) = deadline.or_else(|| config.deadline()) else {
        return Some(expand(target, config).await);
    };
    match tokio::time::timeout(deadline, expand(target, config)).await {
        Ok(outcome) => Some(outcome),
        Err(_) => {
            warn!(
                deadline_ms = deadline.as_millis() as u64,
                "expansion deadline elapsed"
            );
            None
        }
    }
}
