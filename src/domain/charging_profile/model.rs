//! ChargingProfile domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargingRateUnit {
    #[default]
    #[serde(rename = "A")]
    Ampere,
    #[serde(rename = "W")]
    Watt,
}

impl ChargingRateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ampere => "A",
            Self::Watt => "W",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargingProfilePurpose {
    ChargePointMaxProfile,
    #[default]
    TxDefaultProfile,
    TxProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargingProfileKind {
    #[default]
    Absolute,
    Recurring,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrencyKind {
    Daily,
    Weekly,
}

/// One step of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    /// Offset in seconds from the schedule start.
    pub start_period: i32,
    /// Limit expressed in the schedule's rate unit.
    pub limit: f64,
    pub number_phases: Option<u32>,
}

impl SchedulePeriod {
    pub fn new(start_period: i32, limit: f64) -> Self {
        Self {
            start_period,
            limit,
            number_phases: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub rate_unit: ChargingRateUnit,
    pub duration_secs: Option<i32>,
    pub start_schedule: Option<DateTime<Utc>>,
    pub min_charging_rate: Option<f64>,
    pub periods: Vec<SchedulePeriod>,
}

impl Schedule {
    pub fn amps(periods: Vec<SchedulePeriod>) -> Self {
        Self {
            rate_unit: ChargingRateUnit::Ampere,
            duration_secs: None,
            start_schedule: None,
            min_charging_rate: None,
            periods,
        }
    }

    /// Periods must be present, start at non-negative offsets and be
    /// strictly ascending.
    pub fn validate(&self) -> Result<(), String> {
        if self.periods.is_empty() {
            return Err("schedule has no periods".to_string());
        }
        let mut previous: Option<i32> = None;
        for period in &self.periods {
            if period.start_period < 0 {
                return Err(format!("negative start offset {}", period.start_period));
            }
            if period.limit < 0.0 {
                return Err(format!(
                    "negative limit {} at offset {}",
                    period.limit, period.start_period
                ));
            }
            if let Some(prev) = previous {
                if period.start_period <= prev {
                    return Err(format!(
                        "period at offset {} is not after offset {}",
                        period.start_period, prev
                    ));
                }
            }
            previous = Some(period.start_period);
        }
        Ok(())
    }

    /// The period in force at the schedule start, if the schedule begins now.
    pub fn active_now(&self) -> Option<&SchedulePeriod> {
        self.periods.first().filter(|p| p.start_period == 0)
    }

    /// Apply `f` to every period limit (and the minimum rate), keeping shape.
    pub fn map_limits(&self, rate_unit: ChargingRateUnit, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rate_unit,
            duration_secs: self.duration_secs,
            start_schedule: self.start_schedule,
            min_charging_rate: self.min_charging_rate.map(&f),
            periods: self
                .periods
                .iter()
                .map(|p| SchedulePeriod {
                    start_period: p.start_period,
                    limit: f(p.limit),
                    number_phases: p.number_phases,
                })
                .collect(),
        }
    }
}

/// Stored charging profile, canonical form (limits in amps summed over
/// phases, station-wide for connector 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingProfile {
    /// Profile id sent to the device.
    pub profile_id: i32,
    pub charging_station_id: String,
    pub charge_point_id: u32,
    /// Target connector, 0 = whole station.
    pub connector_id: u32,
    pub purpose: ChargingProfilePurpose,
    pub kind: ChargingProfileKind,
    pub recurrency_kind: Option<RecurrencyKind>,
    pub stack_level: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub transaction_id: Option<i32>,
    pub schedule: Schedule,
}

impl ChargingProfile {
    pub fn new(
        profile_id: i32,
        charging_station_id: impl Into<String>,
        connector_id: u32,
        schedule: Schedule,
    ) -> Self {
        Self {
            profile_id,
            charging_station_id: charging_station_id.into(),
            charge_point_id: 1,
            connector_id,
            purpose: ChargingProfilePurpose::TxDefaultProfile,
            kind: ChargingProfileKind::Absolute,
            recurrency_kind: None,
            stack_level: 0,
            valid_from: None,
            valid_to: None,
            transaction_id: None,
            schedule,
        }
    }
}
