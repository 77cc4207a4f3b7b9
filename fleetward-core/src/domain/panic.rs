//! Panic coordination: per-user cooldown, persistence and emergency alerts.

use std::{any::type_name_of_val, fmt, net::IpAddr, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use fleetward_model::{
    PANIC_COOLDOWN_SECS, PanicEvent, PanicEventId, PanicStatus, Position,
    StudentId, UserId,
};
use tracing::{debug, info, warn};

use crate::{
    database::{
        AppUnitOfWork,
        ports::panics::{PanicInsert, PanicRepository},
    },
    domain::messages,
    error::{CoreError, Result, ValidationError, require},
    notify::{MessageKind, NotificationDispatcher, OutboundMessage},
    time::Clock,
};

/// Whole seconds left before `last_at + window` passes, rounded up, or `None`
/// once the window has elapsed.
pub fn cooldown_remaining(
    last_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<i64> {
    let elapsed = now.signed_duration_since(last_at);
    if elapsed >= window {
        return None;
    }
    let remaining = (window - elapsed.max(Duration::zero())).num_milliseconds();
    Some(((remaining + 999) / 1000).max(1))
}

/// Audit data captured from the triggering request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanicMetadata {
    pub created_by: String,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
}

/// A panic button press. Identity fields come from the authenticated caller;
/// position and child come from the request body and are validated here.
#[derive(Debug, Clone, PartialEq)]
pub struct PanicTrigger {
    pub user_id: UserId,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub child_id: Option<StudentId>,
    pub metadata: PanicMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredPanic {
    pub event: PanicEvent,
    /// Cooldown window in seconds, for client-side countdowns.
    pub cooldown_secs: i64,
}

#[derive(Clone)]
pub struct PanicCoordinator {
    panics: Arc<dyn PanicRepository>,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    emergency_contacts: Vec<String>,
    cooldown: Duration,
}

impl fmt::Debug for PanicCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicCoordinator")
            .field("panics", &type_name_of_val(self.panics.as_ref()))
            .field("emergency_contacts", &self.emergency_contacts.len())
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

impl PanicCoordinator {
    pub fn new(
        uow: &AppUnitOfWork,
        notifier: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            panics: Arc::clone(&uow.panics),
            notifier,
            clock,
            emergency_contacts: Vec::new(),
            cooldown: Duration::seconds(PANIC_COOLDOWN_SECS),
        }
    }

    /// Numbers alerted on every panic in addition to the caller's own phone.
    pub fn with_emergency_contacts(mut self, contacts: Vec<String>) -> Self {
        self.emergency_contacts = contacts
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    pub fn cooldown_secs(&self) -> i64 {
        self.cooldown.num_seconds()
    }

    pub async fn trigger(&self, trigger: PanicTrigger) -> Result<TriggeredPanic> {
        let latitude = require(trigger.latitude, "latitude")?;
        let longitude = require(trigger.longitude, "longitude")?;
        let student_id = require(trigger.child_id, "childId")?;
        let position =
            Position::new(latitude, longitude).map_err(ValidationError::from)?;

        let event = PanicEvent {
            id: PanicEventId::new(),
            user_id: trigger.user_id,
            student_id,
            position,
            created_by: trigger.metadata.created_by,
            role: trigger.role,
            status: PanicStatus::Active,
            ip_address: trigger.metadata.ip_address,
            user_agent: trigger.metadata.user_agent,
            created_at: self.clock.now(),
        };

        let event = match self
            .panics
            .insert_respecting_cooldown(event, self.cooldown)
            .await?
        {
            PanicInsert::Created(event) => event,
            PanicInsert::CoolingDown { remaining_secs } => {
                info!(
                    user_id = %trigger.user_id,
                    remaining_secs,
                    "panic trigger refused during cooldown"
                );
                return Err(CoreError::CooldownActive { remaining_secs });
            }
        };

        warn!(
            panic_id = %event.id,
            user_id = %event.user_id,
            child_id = %event.student_id,
            lat = event.position.latitude,
            lng = event.position.longitude,
            "panic event raised"
        );

        self.dispatch_alerts(&event, trigger.phone.as_deref());

        Ok(TriggeredPanic {
            event,
            cooldown_secs: self.cooldown_secs(),
        })
    }

    pub async fn get(&self, id: PanicEventId) -> Result<PanicEvent> {
        self.panics
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("panic event", id))
    }

    /// Seconds until `user_id` may trigger again, or `None` when a trigger
    /// would be accepted now.
    pub async fn cooldown_remaining_for(&self, user_id: UserId) -> Result<Option<i64>> {
        let remaining = self
            .panics
            .latest_for_user(user_id)
            .await?
            .and_then(|last| {
                cooldown_remaining(last.created_at, self.clock.now(), self.cooldown)
            });
        Ok(remaining)
    }

    fn dispatch_alerts(&self, event: &PanicEvent, caller_phone: Option<&str>) {
        let body = messages::emergency_alert(event);
        let mut recipients: Vec<&str> = Vec::new();
        let caller = caller_phone.map(str::trim).filter(|p| !p.is_empty());
        for phone in caller
            .into_iter()
            .chain(self.emergency_contacts.iter().map(String::as_str))
        {
            if !recipients.contains(&phone) {
                recipients.push(phone);
            }
        }

        if recipients.is_empty() {
            debug!(panic_id = %event.id, "no emergency recipients configured");
            return;
        }

        for phone in recipients {
            self.notifier.enqueue(
                OutboundMessage::new(MessageKind::EmergencyAlert, phone, body.clone())
                    .with_reference(event.id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn cooldown_counts_down_in_whole_seconds() {
        let window = Duration::seconds(60);
        assert_eq!(cooldown_remaining(at(0), at(0), window), Some(60));
        assert_eq!(cooldown_remaining(at(0), at(30), window), Some(30));
        assert_eq!(
            cooldown_remaining(at(0), at(59) + Duration::milliseconds(500), window),
            Some(1)
        );
        assert_eq!(cooldown_remaining(at(0), at(60), window), None);
        assert_eq!(cooldown_remaining(at(0), at(61), window), None);
    }

    #[test]
    fn future_dated_event_caps_at_full_window() {
        let window = Duration::seconds(60);
        assert_eq!(cooldown_remaining(at(10), at(0), window), Some(60));
    }
}
