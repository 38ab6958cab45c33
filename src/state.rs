use crate::rate_limit::RateLimiter;

// app's shared state - owned by the middleware chain for the
// lifetime of the process
pub struct AppState {
    pub client: reqwest::Client,
    pub backend: String, // ticket API base URL
    pub limiter: RateLimiter,
}
