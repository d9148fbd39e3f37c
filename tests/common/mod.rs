use queuegate::{Clock, Credentials, ManualClock, RateLimitConfig, RateLimiter};
use std::sync::Arc;

pub const SECRET: &str = "s3cr3t";
pub const START_MS: u64 = 1_700_000_000_000;

pub fn limiter_with_clock(config: RateLimitConfig) -> (RateLimiter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let shared: Arc<dyn Clock> = clock.clone();
    let limiter = RateLimiter::with_clock(config, shared).unwrap();
    (limiter, clock)
}

pub fn game_credentials() -> Credentials {
    let mut credentials = Credentials::new()
        .with("GAME_SERVER_HOST", "play.example.net")
        .with("GAME_SERVER_PASSWORD", "")
        .with("INVITE_CODE", "XK-42");
    credentials.set_optional("ADMIN_TOKEN", None);
    credentials
}
