use crate::database::Database;
use crate::error::PriceError;
use crate::observations::PackSeries;
use crate::units::{normalize, UnitPrice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrendArrow {
    Up,
    Down,
    Flat,
}

impl TrendArrow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendArrow::Up => "↑",
            TrendArrow::Down => "↓",
            TrendArrow::Flat => "→",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trend {
    pub arrow: TrendArrow,
    pub delta_cents: i64,
    pub pct: f64,
}

/// Compare the latest price against the previous one, in minor currency
/// units. A previous price of zero never produces a percentage.
pub fn trend(prev_cents: i64, last_cents: i64) -> Trend {
    let delta_cents = last_cents - prev_cents;

    let arrow = if delta_cents > 0 {
        TrendArrow::Up
    } else if delta_cents < 0 {
        TrendArrow::Down
    } else {
        TrendArrow::Flat
    };

    let pct = if prev_cents > 0 {
        delta_cents as f64 / prev_cents as f64 * 100.0
    } else {
        0.0
    };

    Trend {
        arrow,
        delta_cents,
        pct,
    }
}

/// Movement between the two most recent observations of one pack.
#[derive(Clone, Debug)]
pub struct Movement {
    pub prev_on: String,
    pub prev_cents: i64,
    pub trend: Trend,
}

/// Trend report entry for one (store, pack) group. With only one
/// observation on record the movement is absent and only the latest
/// value is reported.
#[derive(Clone, Debug)]
pub struct PackTrend {
    pub store_name: String,
    pub label: String,
    pub size: f64,
    pub unit: String,
    pub latest_on: String,
    pub latest_cents: i64,
    pub movement: Option<Movement>,
}

impl PackTrend {
    pub fn for_family(db: &Database, family_key: &str) -> Result<Vec<Self>, PriceError> {
        let series = PackSeries::latest_two_for_family(db, family_key)?;

        let mut trends = Vec::with_capacity(series.len());
        for group in series {
            let (latest_on, latest_cents) = match group.points.first() {
                Some(point) => point.clone(),
                None => continue,
            };

            let movement = group.points.get(1).map(|(prev_on, prev_cents)| Movement {
                prev_on: prev_on.clone(),
                prev_cents: *prev_cents,
                trend: trend(*prev_cents, latest_cents),
            });

            trends.push(PackTrend {
                store_name: group.store_name,
                label: group.label,
                size: group.size,
                unit: group.unit,
                latest_on,
                latest_cents,
                movement,
            });
        }

        Ok(trends)
    }

    /// Normalized unit price of the latest observation, when the pack unit
    /// supports it.
    pub fn latest_normalized(&self) -> Option<UnitPrice> {
        normalize(self.latest_cents, self.size, &self.unit)
    }
}
