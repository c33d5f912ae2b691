use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability{
    Unknown,
    Available,
    Unavailable
}

/// Whether this deployment serves a cart at all. Only a server that reports
/// the cart routes as missing flips it to unavailable; outages and timeouts
/// leave it alone. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct BackendAvailability(Arc<AtomicU8>);

impl BackendAvailability {
    const UNKNOWN: u8 = 0;
    const AVAILABLE: u8 = 1;
    const UNAVAILABLE: u8 = 2;

    pub fn new() -> Self{
        Self::default()
    }

    pub fn state(&self) -> Availability{
        match self.0.load(Ordering::Acquire) {
            Self::AVAILABLE => Availability::Available,
            Self::UNAVAILABLE => Availability::Unavailable,
            _ => Availability::Unknown
        }
    }

    /// Not yet contacted counts as available
    pub fn is_available(&self) -> bool{
        self.state() != Availability::Unavailable
    }

    pub fn mark_available(&self){
        self.0.store(Self::AVAILABLE, Ordering::Release)
    }

    pub fn mark_unavailable(&self){
        if self.0.swap(Self::UNAVAILABLE, Ordering::AcqRel) != Self::UNAVAILABLE {
            tracing::warn!("Cart service not provisioned, using the local cart");
        }
    }

    pub fn reset(&self){
        self.0.store(Self::UNKNOWN, Ordering::Release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state_and_reset_forgets_it(){
        let flag = BackendAvailability::new();
        let shared = flag.clone();
        assert_eq!(flag.state(), Availability::Unknown);
        assert!(flag.is_available());

        shared.mark_unavailable();
        assert!(!flag.is_available());

        flag.reset();
        assert_eq!(shared.state(), Availability::Unknown);
    }
}
