use std::time::Duration;

use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    success_threshold: u32,
    open_duration: Duration,
    state: State,
}

enum State {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    // One probe at a time; a probe that never reports back is replaced after `open_duration`.
    HalfOpen {
        successes: u32,
        probe_started: Option<Instant>,
    },
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, success_threshold: u32, open_duration: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            success_threshold: success_threshold.max(1),
            open_duration,
            state: State::Closed { failures: 0 },
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            config.success_threshold,
            Duration::from_millis(config.reset_timeout_ms),
        )
    }

    pub fn state(&self) -> BreakerState {
        match self.state {
            State::Closed { .. } => BreakerState::Closed,
            State::Open { .. } => BreakerState::Open,
            State::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed { .. })
    }

    /// Remaining time before the breaker admits another probe; `None` while calls flow.
    pub fn retry_after(&self) -> Option<Duration> {
        match self.state {
            State::Open { opened_at }
            | State::HalfOpen {
                probe_started: Some(opened_at),
                ..
            } => Some(self.open_duration.saturating_sub(opened_at.elapsed())),
            _ => None,
        }
    }

    pub fn should_allow_call(&mut self) -> bool {
        match &mut self.state {
            State::Closed { .. } => true,
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.open_duration {
                    self.state = State::HalfOpen {
                        successes: 0,
                        probe_started: Some(Instant::now()),
                    };
                    true
                } else {
                    false
                }
            }
            State::HalfOpen { probe_started, .. } => match *probe_started {
                Some(started) if started.elapsed() < self.open_duration => false,
                _ => {
                    *probe_started = Some(Instant::now());
                    true
                }
            },
        }
    }

    pub fn success(&mut self) {
        match &mut self.state {
            State::Closed { failures } => *failures = 0,
            State::HalfOpen {
                successes,
                probe_started,
            } => {
                *successes += 1;
                *probe_started = None;
                if *successes >= self.success_threshold {
                    self.state = State::Closed { failures: 0 };
                }
            }
            State::Open { .. } => {}
        }
    }

    pub fn fail(&mut self) {
        match &mut self.state {
            State::Closed { failures } => {
                *failures += 1;
                if *failures >= self.failure_threshold {
                    self.state = State::Open {
                        opened_at: Instant::now(),
                    };
                }
            }
            State::HalfOpen { .. } => {
                self.state = State::Open {
                    opened_at: Instant::now(),
                };
            }
            State::Open { .. } => {}
        }
    }
}
