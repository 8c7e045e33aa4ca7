//! Smart charging orchestration for a site area
//!
//! Recomputation runs at most once at a time per site area. A run that finds
//! the lock taken is skipped, not queued. The lock is released exactly once
//! however the run ends.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{info, warn};

use crate::application::charging_profiles::ChargingProfileEngine;
use crate::application::outcome::Dispatched;
use crate::application::ports::{LockService, ProfileComputationAlgorithm, StationDirectory};
use crate::application::vendor::VendorRegistry;
use crate::domain::LockScope;
use crate::shared::errors::{ControlError, ControlResult};

/// Outcome of pushing one computed profile.
#[derive(Debug)]
pub struct ProfileApplication {
    pub station_id: String,
    pub connector_id: u32,
    pub profile_id: i32,
    pub result: ControlResult<Dispatched<()>>,
}

#[derive(Debug)]
pub enum SmartChargingRun {
    /// Another run holds the site area lock.
    Skipped,
    Applied(Vec<ProfileApplication>),
}

pub struct SmartChargingOrchestrator {
    locks: Arc<dyn LockService>,
    algorithm: Arc<dyn ProfileComputationAlgorithm>,
    stations: Arc<dyn StationDirectory>,
    vendors: Arc<VendorRegistry>,
    profiles: Arc<ChargingProfileEngine>,
}

impl SmartChargingOrchestrator {
    pub fn new(
        locks: Arc<dyn LockService>,
        algorithm: Arc<dyn ProfileComputationAlgorithm>,
        stations: Arc<dyn StationDirectory>,
        vendors: Arc<VendorRegistry>,
        profiles: Arc<ChargingProfileEngine>,
    ) -> Self {
        Self {
            locks,
            algorithm,
            stations,
            vendors,
            profiles,
        }
    }

    pub async fn compute_and_apply_charging_profiles(
        &self,
        tenant_id: &str,
        site_area_id: &str,
    ) -> ControlResult<SmartChargingRun> {
        let scope = LockScope::smart_charging(tenant_id, site_area_id);
        let Some(lock) = self.locks.acquire(&scope).await? else {
            info!(tenant_id, site_area_id, "Smart charging already running, skipped");
            return Ok(SmartChargingRun::Skipped);
        };

        let run = AssertUnwindSafe(self.apply(tenant_id, site_area_id))
            .catch_unwind()
            .await;

        if let Err(e) = self.locks.release(&lock).await {
            warn!(tenant_id, site_area_id, lock_id = %lock.id, error = %e, "Failed to release smart charging lock");
        }

        match run {
            Ok(result) => result.map(SmartChargingRun::Applied),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn apply(
        &self,
        tenant_id: &str,
        site_area_id: &str,
    ) -> ControlResult<Vec<ProfileApplication>> {
        let profiles = self.algorithm.compute(tenant_id, site_area_id).await?;
        info!(tenant_id, site_area_id, profiles = profiles.len(), "Applying computed charging profiles");

        let mut applications = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let result = match self
                .stations
                .get_station(tenant_id, &profile.charging_station_id)
                .await
            {
                Ok(station) => {
                    let vendor = self.vendors.profile_for(&station.vendor);
                    self.profiles
                        .set_charging_profile_with(tenant_id, &station, vendor, &profile)
                        .await
                }
                Err(e) => Err(ControlError::from(e)),
            };

            if let Err(e) = &result {
                warn!(
                    tenant_id,
                    station_id = profile.charging_station_id.as_str(),
                    profile_id = profile.profile_id,
                    error = %e,
                    "Charging profile not applied"
                );
            }
            applications.push(ProfileApplication {
                station_id: profile.charging_station_id.clone(),
                connector_id: profile.connector_id,
                profile_id: profile.profile_id,
                result,
            });
        }
        Ok(applications)
    }
}
