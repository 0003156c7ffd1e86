use crate::ColorizerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchPhase {
    WaitingForTarget,
    Observing,
}

/// What the content script should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Look for the target container again after the delay.
    PollAgain { after_ms: u32 },
    /// Observe the target container and run a first pass after the delay.
    AttachTarget { initial_pass_after_ms: u32 },
    /// The target never showed up: observe `<body>` instead.
    AttachFallback { initial_pass_after_ms: u32 },
    /// Restart the debounce window.
    Debounce,
    Ignore,
}

/// Decides when DOM changes should lead to an annotation pass.
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    phase: WatchPhase,
    polls: u32,
    idle_retries: u32,
    poll_ms: u32,
    max_target_polls: u32,
    max_idle_retries: u32,
    initial_pass_delay_ms: u32,
}

impl ChangeWatcher {
    pub fn from_config(config: &ColorizerConfig) -> Self {
        Self {
            phase: WatchPhase::WaitingForTarget,
            polls: 0,
            idle_retries: 0,
            poll_ms: config.target_poll_ms,
            max_target_polls: config.max_target_polls,
            max_idle_retries: config.max_idle_retries,
            initial_pass_delay_ms: config.initial_pass_delay_ms,
        }
    }

    #[cfg(test)]
    fn phase(&self) -> WatchPhase {
        self.phase
    }

    #[cfg(test)]
    fn idle_retries(&self) -> u32 {
        self.idle_retries
    }

    /// Result of one lookup of the target container.
    pub fn target_lookup(&mut self, found: bool) -> WatchAction {
        if self.phase != WatchPhase::WaitingForTarget {
            return WatchAction::Ignore;
        }

        if found {
            self.phase = WatchPhase::Observing;
            return WatchAction::AttachTarget {
                initial_pass_after_ms: self.initial_pass_delay_ms,
            };
        }

        self.polls += 1;
        if self.polls >= self.max_target_polls {
            self.phase = WatchPhase::Observing;
            return WatchAction::AttachFallback {
                initial_pass_after_ms: self.initial_pass_delay_ms,
            };
        }

        WatchAction::PollAgain {
            after_ms: self.poll_ms,
        }
    }

    /// A batch of mutations arrived. `relevant` is true when it added a grid
    /// table or rows of one.
    pub fn mutations(&mut self, relevant: bool) -> WatchAction {
        if self.phase != WatchPhase::Observing {
            return WatchAction::Ignore;
        }

        if relevant {
            self.idle_retries = 0;
            return WatchAction::Debounce;
        }

        if self.idle_retries < self.max_idle_retries {
            self.idle_retries += 1;
            WatchAction::Debounce
        } else {
            WatchAction::Ignore
        }
    }
}

/// Keeps annotation passes from overlapping across their async storage read.
/// Requests that arrive while a pass runs collapse into one re-run.
#[derive(Debug, Clone, Default)]
pub struct PassGate {
    running: bool,
    rerun: bool,
}

impl PassGate {
    /// `true` when the caller should start a pass now. Otherwise a re-run is
    /// queued for the pass in flight.
    pub fn try_begin(&mut self) -> bool {
        if self.running {
            self.rerun = true;
            return false;
        }
        self.running = true;
        true
    }

    /// Called when a pass completes. `true` means another pass was requested
    /// meanwhile and the caller should run it while still holding the gate.
    pub fn finish(&mut self) -> bool {
        if self.rerun {
            self.rerun = false;
            return true;
        }
        self.running = false;
        false
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watcher() -> ChangeWatcher {
        ChangeWatcher::from_config(&ColorizerConfig {
            max_target_polls: 3,
            ..ColorizerConfig::default()
        })
    }

    #[test]
    fn polls_until_target_found() {
        let mut watcher = watcher();
        assert_eq!(watcher.mutations(true), WatchAction::Ignore);
        assert_eq!(watcher.target_lookup(false), WatchAction::PollAgain { after_ms: 500 });
        assert_eq!(
            watcher.target_lookup(true),
            WatchAction::AttachTarget {
                initial_pass_after_ms: 1500
            }
        );
        assert_eq!(watcher.phase(), WatchPhase::Observing);
        assert_eq!(watcher.target_lookup(true), WatchAction::Ignore);
    }

    #[test]
    fn falls_back_to_body_after_bounded_polls() {
        let mut watcher = watcher();
        assert!(matches!(watcher.target_lookup(false), WatchAction::PollAgain { .. }));
        assert!(matches!(watcher.target_lookup(false), WatchAction::PollAgain { .. }));
        assert_eq!(
            watcher.target_lookup(false),
            WatchAction::AttachFallback {
                initial_pass_after_ms: 1500
            }
        );
        assert_eq!(watcher.mutations(true), WatchAction::Debounce);
    }

    #[test]
    fn idle_batches_retry_a_bounded_number_of_times() {
        let mut watcher = watcher();
        watcher.target_lookup(true);

        for _ in 0..10 {
            assert_eq!(watcher.mutations(false), WatchAction::Debounce);
        }
        assert_eq!(watcher.mutations(false), WatchAction::Ignore);
        assert_eq!(watcher.idle_retries(), 10);

        assert_eq!(watcher.mutations(true), WatchAction::Debounce);
        assert_eq!(watcher.idle_retries(), 0);
        assert_eq!(watcher.mutations(false), WatchAction::Debounce);
    }

    #[test]
    fn pass_gate_coalesces_requests() {
        let mut gate = PassGate::default();
        assert!(gate.try_begin());
        assert!(!gate.try_begin());
        assert!(!gate.try_begin());

        assert!(gate.finish(), "one re-run for both requests");
        assert!(gate.is_running());
        assert!(!gate.finish());
        assert!(!gate.is_running());
        assert!(gate.try_begin());
    }
}
