//! Synthetic price series shown when the backend has no chart data.
//!
//! The series is a noisy upward drift: each step adds `(u - 0.45) * volatility + 0.5` plus a
//! small sine wave, and the price never drops below [`FLOOR`].

use rand::Rng;

use crate::state::{ChartPeriod, PricePoint};

/// Lowest generated price.
pub const FLOOR: f64 = 10.0;

const TREND: f64 = 0.5;
const START: f64 = 100.0;

/// Number of points and per-step volatility for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub points: usize,
    pub volatility: f64,
}

impl Shape {
    /// `None` covers any period the dashboard does not know.
    pub fn of(period: Option<ChartPeriod>) -> Self {
        let (points, volatility) = match period {
            Some(ChartPeriod::Day) => (24, 2.0),
            Some(ChartPeriod::Week) => (7, 5.0),
            Some(ChartPeriod::Month) => (30, 8.0),
            Some(ChartPeriod::Quarter) => (90, 12.0),
            Some(ChartPeriod::Year) => (52, 20.0),
            Some(ChartPeriod::Decade) => (120, 50.0),
            None => (30, 5.0),
        };
        Self { points, volatility }
    }
}

/// Generate a mock series for `period`, labelled `0:00..23:00` for the 24h chart and
/// `T-n..T-1` otherwise.
pub fn generate<R: Rng + ?Sized>(period: Option<ChartPeriod>, rng: &mut R) -> Vec<PricePoint> {
    let Shape { points, volatility } = Shape::of(period);
    let mut price = START + rng.gen_range(-10.0..10.0);

    (0..points)
        .map(|i| {
            let change = (rng.gen::<f64>() - 0.45) * volatility + TREND;
            let wave = (i as f64 * 0.2).sin() * volatility / 2.0;
            price = (price + change + wave * 0.1).max(FLOOR);

            let label = match period {
                Some(ChartPeriod::Day) => format!("{i}:00"),
                _ => format!("T-{}", points - i),
            };
            PricePoint::new(label, price)
        })
        .collect()
}

/// The chart label marking generated data.
pub fn label(period: Option<ChartPeriod>) -> String {
    match period {
        Some(period) => format!("Mock {period} Data (Backend Unavailable)"),
        None => "Mock Data (Backend Unavailable)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn week_has_seven_labelled_points() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = generate(Some(ChartPeriod::Week), &mut rng);

        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["T-7", "T-6", "T-5", "T-4", "T-3", "T-2", "T-1"]);
        assert!(points.iter().all(|p| p.close >= FLOOR));
    }

    #[test]
    fn every_period_respects_shape_and_floor() {
        let mut rng = StdRng::seed_from_u64(42);
        for period in ChartPeriod::ALL.map(Some).into_iter().chain([None]) {
            let points = generate(period, &mut rng);
            assert_eq!(points.len(), Shape::of(period).points);
            assert!(points.iter().all(|p| p.close >= FLOOR && p.close.is_finite()));
        }
    }

    #[test]
    fn intraday_labels_are_hours() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = generate(Some(ChartPeriod::Day), &mut rng);
        assert_eq!(points.first().unwrap().label, "0:00");
        assert_eq!(points.last().unwrap().label, "23:00");
    }

    #[test]
    fn same_seed_same_series() {
        let a = generate(Some(ChartPeriod::Quarter), &mut StdRng::seed_from_u64(9));
        let b = generate(Some(ChartPeriod::Quarter), &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn labels() {
        assert_eq!(label(Some(ChartPeriod::Month)), "Mock 1m Data (Backend Unavailable)");
        assert_eq!(label(None), "Mock Data (Backend Unavailable)");
    }
}
