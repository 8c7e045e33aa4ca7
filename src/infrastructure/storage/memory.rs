//! In-memory station directory and lock service for development and testing

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::application::ports::{LockService, StationDirectory};
use crate::domain::{ChargingStation, Lock, LockScope};
use crate::shared::errors::DomainError;

type StationKey = (String, String);

/// Station records keyed by tenant and station id
#[derive(Default)]
pub struct InMemoryStationDirectory {
    stations: DashMap<StationKey, ChargingStation>,
}

impl InMemoryStationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant_id: &str, station: ChargingStation) {
        self.stations
            .insert((tenant_id.to_string(), station.id.clone()), station);
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[async_trait]
impl StationDirectory for InMemoryStationDirectory {
    async fn get_station(
        &self,
        tenant_id: &str,
        station_id: &str,
    ) -> Result<ChargingStation, DomainError> {
        self.stations
            .get(&(tenant_id.to_string(), station_id.to_string()))
            .map(|s| s.clone())
            .ok_or_else(|| DomainError::NotFound {
                entity: "ChargingStation",
                field: "id",
                value: station_id.to_string(),
            })
    }

    async fn save_station(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
    ) -> Result<(), DomainError> {
        self.stations
            .insert((tenant_id.to_string(), station.id.clone()), station.clone());
        Ok(())
    }
}

/// Non-blocking exclusive locks with a time-to-live.
///
/// An expired lock is taken over by the next `acquire`, so a crashed holder
/// cannot block its scope longer than the TTL.
pub struct InMemoryLockService {
    locks: DashMap<String, Lock>,
    ttl: chrono::Duration,
}

impl InMemoryLockService {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            locks: DashMap::new(),
            ttl,
        }
    }

    pub fn is_held(&self, scope: &LockScope) -> bool {
        self.locks
            .get(&scope.key())
            .map(|lock| !lock.is_expired())
            .unwrap_or(false)
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, scope: &LockScope) -> Result<Option<Lock>, DomainError> {
        match self.locks.entry(scope.key()) {
            Entry::Occupied(mut held) => {
                if !held.get().is_expired() {
                    debug!(scope = %scope.key(), "Lock already held");
                    return Ok(None);
                }
                warn!(scope = %scope.key(), previous = %held.get().id, "Taking over expired lock");
                let lock = Lock::new(scope.clone(), self.ttl);
                held.insert(lock.clone());
                Ok(Some(lock))
            }
            Entry::Vacant(slot) => {
                let lock = Lock::new(scope.clone(), self.ttl);
                slot.insert(lock.clone());
                Ok(Some(lock))
            }
        }
    }

    async fn release(&self, lock: &Lock) -> Result<(), DomainError> {
        let removed = self
            .locks
            .remove_if(&lock.scope.key(), |_, held| held.id == lock.id);
        if removed.is_none() {
            warn!(scope = %lock.scope.key(), lock_id = %lock.id, "Released a lock that was no longer held");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OcppProtocol, OcppVersion};

    #[tokio::test]
    async fn stations_are_tenant_scoped() {
        let directory = InMemoryStationDirectory::new();
        directory.insert(
            "t1",
            ChargingStation::new("CS-1", OcppProtocol::Json, OcppVersion::V16, "ACME"),
        );

        assert!(directory.get_station("t1", "CS-1").await.is_ok());
        let err = directory.get_station("t2", "CS-1").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn save_overwrites() {
        let directory = InMemoryStationDirectory::new();
        let mut station = ChargingStation::new("CS-1", OcppProtocol::Json, OcppVersion::V16, "ACME");
        directory.save_station("t1", &station).await.unwrap();
        station.vendor = "Other".into();
        directory.save_station("t1", &station).await.unwrap();

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get_station("t1", "CS-1").await.unwrap().vendor, "Other");
    }

    #[tokio::test]
    async fn lock_is_exclusive_until_released() {
        let service = InMemoryLockService::new(chrono::Duration::seconds(60));
        let scope = LockScope::smart_charging("t1", "area-1");

        let lock = service.acquire(&scope).await.unwrap().unwrap();
        assert!(service.acquire(&scope).await.unwrap().is_none());
        // Other site areas are independent
        assert!(service
            .acquire(&LockScope::smart_charging("t1", "area-2"))
            .await
            .unwrap()
            .is_some());

        service.release(&lock).await.unwrap();
        assert!(!service.is_held(&scope));
        assert!(service.acquire(&scope).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_lock_is_taken_over_and_stale_release_is_harmless() {
        let service = InMemoryLockService::new(chrono::Duration::seconds(-1));
        let scope = LockScope::smart_charging("t1", "area-1");

        let stale = service.acquire(&scope).await.unwrap().unwrap();
        let fresh = service.acquire(&scope).await.unwrap().unwrap();
        assert_ne!(stale.id, fresh.id);

        service.release(&stale).await.unwrap();
        assert!(service.locks.contains_key(&scope.key()));
        service.release(&fresh).await.unwrap();
        assert!(service.locks.is_empty());
    }
}
