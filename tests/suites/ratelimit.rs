use crate::common::limiter_with_clock;
use queuegate::{RateLimitConfig, RateLimiter};

#[test]
fn test_connection_limiter_scenario() {
    let limiter = RateLimiter::new(RateLimitConfig::connection().with_max_attempts(2)).unwrap();

    let decisions: Vec<_> = (0..3).map(|_| limiter.check("1.2.3.4", true)).collect();
    let allowed: Vec<bool> = decisions.iter().map(|d| d.allowed).collect();

    assert_eq!(allowed, [true, true, false]);
    assert!(decisions[2].retry_after_secs.is_some_and(|secs| secs > 0));
}

#[test]
fn test_exactly_n_allowed_per_window() {
    let n = 5;
    let (limiter, clock) =
        limiter_with_clock(RateLimitConfig::connection().with_max_attempts(n));

    for _ in 0..n {
        assert!(limiter.check("ip", true).allowed);
    }
    assert!(!limiter.check("ip", true).allowed);

    clock.advance(60_000);
    assert!(limiter.check("ip", true).allowed);
}

#[test]
fn test_keys_are_independent() {
    let (limiter, _) = limiter_with_clock(RateLimitConfig::connection().with_max_attempts(1));
    limiter.check("a", true);
    assert!(!limiter.check("a", true).allowed);
    assert!(limiter.check("b", true).allowed);
}

#[test]
fn test_reset_unblocks() {
    let (limiter, _) = limiter_with_clock(RateLimitConfig::connection().with_max_attempts(1));
    limiter.check("k", true);
    assert!(!limiter.check("k", true).allowed);

    limiter.reset("k");
    assert!(limiter.check("k", true).allowed);
}

#[test]
fn test_invite_flow_only_counts_failures() {
    let (limiter, clock) = limiter_with_clock(RateLimitConfig::invite().with_max_attempts(3));

    // successful redemptions never consume budget
    for _ in 0..10 {
        assert!(limiter.check("9.9.9.9", false).allowed);
    }
    assert_eq!(limiter.size(), 0);

    for _ in 0..3 {
        assert!(limiter.check("9.9.9.9", false).allowed);
        limiter.record_failure("9.9.9.9");
    }

    let blocked = limiter.check("9.9.9.9", false);
    assert!(!blocked.allowed);
    assert_eq!(blocked.retry_after_secs, Some(3600));

    clock.advance(30 * 60 * 1000);
    assert_eq!(limiter.check("9.9.9.9", false).retry_after_secs, Some(1800));

    clock.advance(30 * 60 * 1000);
    assert!(limiter.check("9.9.9.9", false).allowed);
}

#[test]
fn test_periodic_cleanup_bounds_memory() {
    let (limiter, clock) = limiter_with_clock(RateLimitConfig::connection());
    for i in 0..200 {
        limiter.check(&format!("10.0.0.{i}"), true);
    }
    assert_eq!(limiter.size(), 200);

    clock.advance(60_000);
    assert_eq!(limiter.cleanup(), 200);
    assert_eq!(limiter.size(), 0);
}

#[test]
fn test_shared_across_threads() {
    let (limiter, _) = limiter_with_clock(RateLimitConfig::connection().with_max_attempts(100));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let limiter = limiter.clone();
            std::thread::spawn(move || {
                (0..50)
                    .filter(|_| limiter.check("shared", true).allowed)
                    .count()
            })
        })
        .collect();

    let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(allowed, 100);
}
