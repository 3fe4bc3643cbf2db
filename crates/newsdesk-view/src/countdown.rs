/// Seconds left before the backend accepts the next quota-bound request.
///
/// `Active { remaining: 0 }` never exists: the last tick lands on `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitCountdown {
    #[default]
    Inactive,
    Active {
        remaining: u32,
    },
}

/// What a single one-second tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running(u32),
    Expired,
    /// Nothing was counting.
    Idle,
}

impl RateLimitCountdown {
    pub fn start(seconds: u32) -> Self {
        match seconds {
            0 => RateLimitCountdown::Inactive,
            remaining => RateLimitCountdown::Active { remaining },
        }
    }

    pub fn tick(&mut self) -> Tick {
        match *self {
            RateLimitCountdown::Inactive => Tick::Idle,
            RateLimitCountdown::Active { remaining } if remaining <= 1 => {
                *self = RateLimitCountdown::Inactive;
                Tick::Expired
            }
            RateLimitCountdown::Active { remaining } => {
                *self = RateLimitCountdown::Active {
                    remaining: remaining - 1,
                };
                Tick::Running(remaining - 1)
            }
        }
    }

    pub fn stop(&mut self) {
        *self = RateLimitCountdown::Inactive;
    }

    pub fn remaining(&self) -> Option<u32> {
        match self {
            RateLimitCountdown::Inactive => None,
            RateLimitCountdown::Active { remaining } => Some(*remaining),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RateLimitCountdown::Active { .. })
    }

    /// `Rate limit: <n>s` while counting, empty otherwise.
    pub fn message(&self) -> String {
        match self {
            RateLimitCountdown::Inactive => String::new(),
            RateLimitCountdown::Active { remaining } => format!("Rate limit: {remaining}s"),
        }
    }
}
