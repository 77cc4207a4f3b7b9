//! Live-location reconciliation: the write path (`ingest`) and the read-side
//! fan-out over the tracking feed (`sync`).

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use fleetward_model::{
    IngestOutcome, LocationSample, LocationSampleId, Position, VehicleId,
    VehicleLocationView,
    api_types::{DeviceIdInput, IngestLocationRequest},
};
use tracing::{debug, info, warn};

use crate::{
    database::ports::{
        directory::VehicleDirectory,
        locations::{LocationFix, LocationRepository},
    },
    error::{CoreError, Result, ValidationError, require},
    time::Clock,
    tracking::{TrackerUnit, TrackingProvider},
};

pub const DEBOUNCE_WINDOW_SECS: i64 = 6;
pub const UNKNOWN_MOVEMENT_STATE: &str = "unknown";

/// True when a fix arriving at `now` should overwrite `latest` instead of
/// appending.
pub fn coalesces_into(
    latest: &LocationSample,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    now.signed_duration_since(latest.ingested_at) < window
}

pub fn apply_fix(sample: &mut LocationSample, fix: LocationFix, now: DateTime<Utc>) {
    sample.device_id = fix.device_id.or(sample.device_id.take());
    sample.latitude = fix.latitude;
    sample.longitude = fix.longitude;
    sample.direction = fix.direction;
    sample.speed = fix.speed;
    sample.state = fix.state;
    sample.movement_state = fix.movement_state;
    sample.provider_timestamp = fix.provider_timestamp;
    sample.ingested_at = now;
}

pub fn sample_from_fix(fix: LocationFix, now: DateTime<Utc>) -> LocationSample {
    LocationSample {
        id: LocationSampleId::new(),
        vehicle_id: fix.vehicle_id,
        device_id: fix.device_id,
        latitude: fix.latitude,
        longitude: fix.longitude,
        direction: fix.direction,
        speed: fix.speed,
        state: fix.state,
        movement_state: fix.movement_state,
        provider_timestamp: fix.provider_timestamp,
        ingested_at: now,
    }
}

/// One inbound position report, already shape-checked.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport {
    /// Vehicle registration as the tracker knows it.
    pub unit_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub direction: Option<f64>,
    pub speed: Option<f64>,
    pub state: Option<String>,
    pub movement_state: Option<String>,
    pub provider_timestamp: Option<DateTime<Utc>>,
    pub device_id: Option<String>,
}

impl LocationReport {
    pub fn from_request(
        request: IngestLocationRequest,
    ) -> std::result::Result<Self, ValidationError> {
        let unit_id = require(
            request.unit_id.filter(|unit| !unit.trim().is_empty()),
            "unit_id",
        )?;
        Ok(Self {
            unit_id,
            latitude: require(request.lat, "lat")?,
            longitude: require(request.lng, "lng")?,
            direction: request.direction,
            speed: request.speed,
            state: request.state.and_then(|state| state.name),
            movement_state: request.movement_state.and_then(|state| state.name),
            provider_timestamp: request
                .last_update
                .as_ref()
                .and_then(|raw| raw.parse()),
            device_id: request
                .box_id
                .and_then(DeviceIdInput::into_device_id),
        })
    }

    fn from_view(view: &VehicleLocationView) -> Option<Self> {
        Some(Self {
            unit_id: view.plate_number.clone(),
            latitude: view.lat?,
            longitude: view.lng?,
            direction: Some(view.direction),
            speed: Some(view.speed),
            state: None,
            movement_state: Some(view.movement_state.clone()),
            provider_timestamp: Some(view.last_update),
            device_id: view.device_id.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestedLocation {
    pub sample: LocationSample,
    pub outcome: IngestOutcome,
}

impl IngestedLocation {
    pub fn updated_existing(&self) -> bool {
        self.outcome == IngestOutcome::UpdatedExisting
    }
}

/// Totals from feeding one sync pass back through `ingest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct LocationReconciler {
    vehicles: Arc<dyn VehicleDirectory>,
    locations: Arc<dyn LocationRepository>,
    provider: Option<Arc<dyn TrackingProvider>>,
    clock: Arc<dyn Clock>,
    debounce: Duration,
}

impl fmt::Debug for LocationReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationReconciler")
            .field("has_provider", &self.provider.is_some())
            .field("clock", &self.clock)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl LocationReconciler {
    pub fn new(
        vehicles: Arc<dyn VehicleDirectory>,
        locations: Arc<dyn LocationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vehicles,
            locations,
            provider: None,
            clock,
            debounce: Duration::seconds(DEBOUNCE_WINDOW_SECS),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn TrackingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Write path. Unknown units fail this call; nothing is buffered.
    pub async fn ingest(&self, report: LocationReport) -> Result<IngestedLocation> {
        let plate = report.unit_id.trim();
        let vehicle = self
            .vehicles
            .find_by_plate(plate)
            .await?
            .ok_or_else(|| CoreError::not_found("bus", plate))?;
        let position = Position::new(report.latitude, report.longitude)?;
        let now = self.clock.now();

        let fix = LocationFix {
            vehicle_id: vehicle.id,
            device_id: report.device_id,
            latitude: position.latitude,
            longitude: position.longitude,
            direction: report.direction.unwrap_or(0.0),
            speed: report.speed.unwrap_or(0.0),
            state: report.state,
            movement_state: report
                .movement_state
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_MOVEMENT_STATE.to_string()),
            provider_timestamp: report.provider_timestamp.unwrap_or(now),
        };

        let (sample, outcome) = self
            .locations
            .record_debounced(fix, now, self.debounce)
            .await?;

        debug!(
            vehicle_id = %vehicle.id,
            plate = %vehicle.plate_number,
            outcome = ?outcome,
            "location sample recorded"
        );

        Ok(IngestedLocation { sample, outcome })
    }

    /// Merged view of every known vehicle that the tracker currently reports.
    /// Provider failures degrade to an empty list. Nothing is written.
    pub async fn sync(&self) -> Result<Vec<VehicleLocationView>> {
        let Some(provider) = self.provider.as_ref() else {
            debug!("location sync skipped: no tracking provider configured");
            return Ok(Vec::new());
        };

        let vehicles = self.vehicles.list().await?;
        let units = match provider.fetch_units().await {
            Ok(units) => units,
            Err(err) => {
                warn!(error = %err, "tracking provider unavailable; returning empty sync");
                return Ok(Vec::new());
            }
        };

        let now = self.clock.now();
        let by_plate = index_latest_by_plate(units);

        let mut views = Vec::with_capacity(vehicles.len());
        let mut unmatched = 0usize;
        for vehicle in vehicles {
            let Some(unit) = by_plate.get(vehicle.plate_number.trim()) else {
                unmatched += 1;
                continue;
            };
            views.push(VehicleLocationView {
                vehicle_id: vehicle.id,
                plate_number: vehicle.plate_number.clone(),
                driver_id: vehicle.driver_id,
                assistant_id: vehicle.assistant_id,
                lat: unit.latitude,
                lng: unit.longitude,
                direction: unit.direction.unwrap_or(0.0),
                speed: unit.speed.unwrap_or(0.0),
                movement_state: unit
                    .movement_state
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_MOVEMENT_STATE.to_string()),
                last_update: unit.last_update.unwrap_or(now),
                device_id: unit.device_id.clone(),
            });
        }

        info!(
            matched = views.len(),
            unmatched,
            "location sync merged tracker feed"
        );
        Ok(views)
    }

    /// Run a sync pass and push every positioned row through `ingest`.
    pub async fn sync_and_persist(&self) -> Result<PersistSummary> {
        let views = self.sync().await?;
        let mut summary = PersistSummary::default();

        for view in &views {
            let Some(report) = LocationReport::from_view(view) else {
                summary.skipped += 1;
                continue;
            };
            match self.ingest(report).await {
                Ok(ingested) if ingested.updated_existing() => summary.updated += 1,
                Ok(_) => summary.created += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(
                        vehicle_id = %view.vehicle_id,
                        error = %err,
                        "failed to persist synced location"
                    );
                }
            }
        }

        Ok(summary)
    }

    pub async fn latest(&self, vehicle_id: VehicleId) -> Result<LocationSample> {
        self.locations
            .latest(vehicle_id)
            .await?
            .ok_or_else(|| CoreError::not_found("location for bus", vehicle_id))
    }
}

/// Key the feed by trimmed plate, keeping the freshest unit when the feed
/// repeats a registration.
fn index_latest_by_plate(units: Vec<TrackerUnit>) -> HashMap<String, TrackerUnit> {
    let mut by_plate: HashMap<String, TrackerUnit> = HashMap::new();
    for unit in units {
        let plate = unit.plate.trim().to_string();
        if plate.is_empty() {
            continue;
        }
        match by_plate.get(&plate) {
            Some(existing) if existing.last_update >= unit.last_update => {}
            _ => {
                by_plate.insert(plate, unit);
            }
        }
    }
    by_plate
}
