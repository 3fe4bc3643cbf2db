pub mod countdown;
pub mod fallback;
pub mod launcher;
pub mod session;
pub mod state;
pub mod viewmodel;

pub use crate::countdown::RateLimitCountdown;
pub use crate::launcher::{Launcher, SystemLauncher};
pub use crate::session::Session;
pub use crate::state::{
    ActivityLog, ChartPeriod, Fundamentals, LogLevel, NewsItem, PricePoint, SectorNewsItem,
    ViewState,
};
pub use crate::viewmodel::{Followup, Op, OpKind, Pending, ViewModel};
