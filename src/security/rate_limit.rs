use std::{collections::HashMap, sync::{Arc, Mutex, PoisonError}, time::{Duration, Instant}};

use crate::configuration::SecuritySettings;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<Instant>>);

impl ManualClock {
    pub fn new() -> Self{
        ManualClock(Arc::new(Mutex::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration){
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy)]
struct AttemptRecord{
    count: u32,
    reset_at: Instant
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision{
    Allowed,
    Denied{ attempts: u32, retry_after: Duration }
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool{
        matches!(self, RateLimitDecision::Allowed)
    }
}

#[derive(Debug)]
struct Records{
    by_identifier: HashMap<String, AttemptRecord>,
    next_sweep: Instant
}

impl Records {
    // Expired windows are dropped at most once per window length
    fn sweep(&mut self, now: Instant, window: Duration){
        if now < self.next_sweep {
            return;
        }
        let before = self.by_identifier.len();
        self.by_identifier.retain(|_, record| record.reset_at >= now);
        self.next_sweep = now + window;

        let dropped = before - self.by_identifier.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = self.by_identifier.len(), "Pruned expired rate limit windows");
        }
    }
}

/// Fixed-window attempt counter keyed by an arbitrary identifier (login email).
/// Lives in process memory and is shared through `web::Data`.
pub struct RateLimiter{
    max_attempts: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    records: Mutex<Records>
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration, clock: Arc<dyn Clock>) -> Self{
        let next_sweep = clock.now() + window;
        RateLimiter{
            max_attempts,
            window,
            clock,
            records: Mutex::new(Records{ by_identifier: HashMap::new(), next_sweep })
        }
    }

    pub fn from_settings(settings: &SecuritySettings) -> Self{
        Self::new(
            settings.login_max_attempts,
            Duration::from_secs(settings.login_window_secs),
            Arc::new(SystemClock)
        )
    }

    /// Counts an attempt for `identifier`. The first attempt after the window
    /// has elapsed starts a fresh window.
    pub fn check(&self, identifier: &str) -> RateLimitDecision{
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.sweep(now, self.window);

        match records.by_identifier.get_mut(identifier) {
            Some(record) if now <= record.reset_at => {
                if record.count >= self.max_attempts {
                    RateLimitDecision::Denied{
                        attempts: record.count,
                        retry_after: record.reset_at.saturating_duration_since(now)
                    }
                } else {
                    record.count += 1;
                    RateLimitDecision::Allowed
                }
            },
            _ => {
                records.by_identifier.insert(identifier.to_string(), AttemptRecord{ count: 1, reset_at: now + self.window });
                RateLimitDecision::Allowed
            }
        }
    }

    /// Forgets `identifier`, used after a successful login
    pub fn clear(&self, identifier: &str){
        self.records.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_identifier
            .remove(identifier);
    }

    pub fn reset(&self){
        self.records.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_identifier
            .clear();
    }

    /// Number of identifiers currently tracked
    pub fn tracked(&self) -> usize{
        self.records.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_identifier
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn limiter(max_attempts: u32) -> (RateLimiter, ManualClock){
        let clock = ManualClock::new();
        let limiter = RateLimiter::new(max_attempts, Duration::from_secs(900), Arc::new(clock.clone()));
        (limiter, clock)
    }

    #[test]
    fn sixth_attempt_in_window_is_denied(){
        let (limiter, _) = limiter(5);

        for _ in 0..5 {
            assert!(limiter.check("a@example.com").is_allowed());
        }
        let decision = limiter.check("a@example.com");
        assert!(matches!(decision, RateLimitDecision::Denied{ attempts: 5, .. }));
    }

    #[test]
    fn window_elapsing_allows_again_and_resets_the_counter(){
        let (limiter, clock) = limiter(5);
        for _ in 0..6 {
            limiter.check("a@example.com");
        }

        clock.advance(Duration::from_secs(901));
        assert!(limiter.check("a@example.com").is_allowed());

        // counter restarted at one, so four more fit in the new window
        for _ in 0..4 {
            assert!(limiter.check("a@example.com").is_allowed());
        }
        assert!(!limiter.check("a@example.com").is_allowed());
    }

    #[test]
    fn identifiers_are_counted_separately(){
        let (limiter, _) = limiter(1);
        assert!(limiter.check("a").is_allowed());
        assert!(!limiter.check("a").is_allowed());
        assert!(limiter.check("b").is_allowed());
    }

    #[test]
    fn clear_and_reset_forget_attempts(){
        let (limiter, _) = limiter(1);
        limiter.check("a");
        limiter.check("b");

        limiter.clear("a");
        assert!(limiter.check("a").is_allowed());
        assert!(!limiter.check("b").is_allowed());

        limiter.reset();
        assert!(limiter.check("b").is_allowed());
    }

    #[test]
    fn retry_after_counts_down_with_the_clock(){
        let (limiter, clock) = limiter(1);
        limiter.check("a");
        clock.advance(Duration::from_secs(300));

        match limiter.check("a") {
            RateLimitDecision::Denied{ retry_after, .. } => assert_eq!(retry_after, Duration::from_secs(600)),
            RateLimitDecision::Allowed => panic!("expected the attempt to be denied")
        }
    }

    #[test]
    fn expired_identifiers_are_pruned(){
        let (limiter, clock) = limiter(5);
        for n in 0..100 {
            limiter.check(&format!("attacker{}@example.com", n));
        }
        assert_eq!(limiter.tracked(), 100);

        clock.advance(Duration::from_secs(901));
        limiter.check("fresh@example.com");

        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn live_windows_survive_a_sweep(){
        let (limiter, clock) = limiter(1);
        limiter.check("old");
        clock.advance(Duration::from_secs(600));
        limiter.check("recent");

        clock.advance(Duration::from_secs(301));
        limiter.check("trigger");

        assert_eq!(limiter.tracked(), 2);
        assert!(!limiter.check("recent").is_allowed());
    }

    #[quickcheck]
    fn only_the_first_max_attempts_are_allowed(max_attempts: u8, calls: u8) -> bool{
        let max_attempts = u32::from(max_attempts % 20) + 1;
        let (limiter, _) = limiter(max_attempts);

        (0..u32::from(calls)).all(|n| limiter.check("id").is_allowed() == (n < max_attempts))
    }
}
