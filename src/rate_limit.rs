use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

// Per-client window - admission instants, oldest first.
// Never holds an entry older than one hour relative to the last check.
#[derive(Default)]
struct ClientWindow {
    timestamps: VecDeque<Instant>,
}

impl ClientWindow {
    // Drop everything older than an hour before `now`
    fn prune(&mut self, now: Instant) {
        while self
            .timestamps
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) > HOUR)
        {
            self.timestamps.pop_front();
        }
    }

    // Admissions within the trailing minute (timestamps are ordered,
    // so scan from the newest end)
    fn recent(&self, now: Instant) -> usize {
        self.timestamps
            .iter()
            .rev()
            .take_while(|&&t| now.saturating_duration_since(t) < MINUTE)
            .count()
    }
}

// Two-tier sliding window limiter, shared across all request tasks.
// One window per client identifier, created on first request.
pub struct RateLimiter {
    windows: DashMap<String, ClientWindow>,
    requests_per_minute: u32,
    requests_per_hour: u32,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, requests_per_hour: u32) -> Self {
        Self {
            windows: DashMap::new(),
            requests_per_minute,
            requests_per_hour,
        }
    }

    // Admission check. Prunes stale entries either way; records `now`
    // only when the request is let through.
    //
    // The DashMap entry guard is held for the whole prune-count-append
    // sequence, so concurrent checks for the same client serialize and
    // each one sees every admission that preceded it.
    pub fn admit(&self, client: &str, now: Instant) -> bool {
        let mut window = self.windows.entry(client.to_string()).or_default();
        window.prune(now);

        if window.recent(now) >= self.requests_per_minute as usize
            || window.timestamps.len() >= self.requests_per_hour as usize
        {
            return false;
        }

        window.timestamps.push_back(now);
        true
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    // Evict windows with no admission in the trailing hour. Called from
    // the background sweeper so idle clients don't accumulate forever.
    // Returns how many windows were dropped; counted inside the retain
    // pass so concurrent first-requests can't skew it.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut evicted = 0;
        self.windows.retain(|_, window| {
            window.prune(now);
            if window.timestamps.is_empty() {
                evicted += 1;
                return false;
            }
            true
        });
        evicted
    }

    #[cfg(test)]
    fn window_len(&self, client: &str) -> usize {
        self.windows.get(client).map_or(0, |w| w.timestamps.len())
    }
}
