use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use fleetward_model::{PanicEvent, PanicEventId, UserId};
use tokio::sync::Mutex;

use crate::{
    database::ports::panics::{PanicInsert, PanicRepository},
    domain::panic::cooldown_remaining,
    error::Result,
};

type UserEvents = Arc<Mutex<Vec<PanicEvent>>>;

#[derive(Debug, Default)]
pub struct MemoryPanicStore {
    by_user: DashMap<UserId, UserEvents>,
}

impl MemoryPanicStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn events_for(&self, user_id: UserId) -> UserEvents {
        self.by_user.entry(user_id).or_default().clone()
    }

    fn existing_events_for(&self, user_id: UserId) -> Option<UserEvents> {
        self.by_user.get(&user_id).map(|entry| entry.clone())
    }
}

#[async_trait]
impl PanicRepository for MemoryPanicStore {
    async fn insert_respecting_cooldown(
        &self,
        event: PanicEvent,
        cooldown: Duration,
    ) -> Result<PanicInsert> {
        let events = self.events_for(event.user_id);
        let mut events = events.lock().await;

        if let Some(last) = events.last()
            && let Some(remaining_secs) =
                cooldown_remaining(last.created_at, event.created_at, cooldown)
        {
            return Ok(PanicInsert::CoolingDown { remaining_secs });
        }

        events.push(event.clone());
        Ok(PanicInsert::Created(event))
    }

    async fn get(&self, id: PanicEventId) -> Result<Option<PanicEvent>> {
        let slots: Vec<UserEvents> =
            self.by_user.iter().map(|entry| entry.value().clone()).collect();
        for slot in slots {
            if let Some(found) =
                slot.lock().await.iter().find(|event| event.id == id)
            {
                return Ok(Some(found.clone()));
            }
        }
        Ok(None)
    }

    async fn latest_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<PanicEvent>> {
        let Some(events) = self.existing_events_for(user_id) else {
            return Ok(None);
        };
        let events = events.lock().await;
        Ok(events.last().cloned())
    }
}
