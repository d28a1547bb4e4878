use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct LayoutCounters {
    requests: u64,
    cache_hits: u64,
    /// Recompute latencies in microseconds, oldest first.
    recompute_latencies: VecDeque<u64>,
}

#[derive(Debug, Default)]
struct TraversalCounters {
    runs: u64,
    nodes_reached: u64,
}

#[derive(Debug)]
struct MetricsState {
    layout: LayoutCounters,
    traversal: TraversalCounters,
    window: usize,
}

/// Shared, cheaply clonable recorder for layout and traversal work.
#[derive(Clone)]
pub struct MetricsCollector {
    state: Arc<Mutex<MetricsState>>,
}

impl MetricsCollector {
    /// `window` bounds how many recompute latencies feed the percentiles.
    pub fn new(window: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MetricsState {
                layout: LayoutCounters::default(),
                traversal: TraversalCounters::default(),
                window: window.max(1),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One `layout()` request. Only recomputes enter the latency window.
    pub fn record_layout(&self, latency_us: u64, is_cache_hit: bool) {
        let mut state = self.lock();
        let window = state.window;
        let layout = &mut state.layout;
        layout.requests += 1;
        if is_cache_hit {
            layout.cache_hits += 1;
            return;
        }
        if layout.recompute_latencies.len() == window {
            layout.recompute_latencies.pop_front();
        }
        layout.recompute_latencies.push_back(latency_us);
    }

    pub fn record_traversal(&self, reached: usize) {
        let mut state = self.lock();
        state.traversal.runs += 1;
        state.traversal.nodes_reached += reached as u64;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        MetricsSnapshot {
            layout: LayoutMetrics::from_counters(&state.layout),
            traversal: TraversalMetrics {
                runs: state.traversal.runs,
                nodes_reached: state.traversal.nodes_reached,
                avg_reach: ratio(state.traversal.nodes_reached, state.traversal.runs),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencySummary {
    fn from_window(window: &VecDeque<u64>) -> Self {
        let mut sorted: Vec<u64> = window.iter().copied().collect();
        sorted.sort_unstable();
        Self {
            samples: sorted.len(),
            p50_us: nearest_rank(&sorted, 50),
            p95_us: nearest_rank(&sorted, 95),
            p99_us: nearest_rank(&sorted, 99),
            max_us: sorted.last().copied().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutMetrics {
    /// Every `layout()` request, served from cache or not.
    pub requests: u64,
    pub recomputes: u64,
    pub cache_hits: u64,
    pub hit_rate: f64,
    pub recompute_latency: LatencySummary,
}

impl LayoutMetrics {
    fn from_counters(counters: &LayoutCounters) -> Self {
        Self {
            requests: counters.requests,
            recomputes: counters.requests - counters.cache_hits,
            cache_hits: counters.cache_hits,
            hit_rate: ratio(counters.cache_hits, counters.requests),
            recompute_latency: LatencySummary::from_window(&counters.recompute_latencies),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraversalMetrics {
    pub runs: u64,
    pub nodes_reached: u64,
    pub avg_reach: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub layout: LayoutMetrics,
    pub traversal: TraversalMetrics,
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Smallest sample with at least `pct` percent of the window at or below it.
fn nearest_rank(sorted: &[u64], pct: usize) -> u64 {
    let rank = (sorted.len() * pct).div_ceil(100).max(1);
    sorted.get(rank - 1).copied().unwrap_or(0)
}
