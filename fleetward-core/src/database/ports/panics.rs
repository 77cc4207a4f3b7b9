use async_trait::async_trait;
use chrono::Duration;
use fleetward_model::{PanicEvent, PanicEventId, UserId};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum PanicInsert {
    Created(PanicEvent),
    CoolingDown { remaining_secs: i64 },
}

#[async_trait]
pub trait PanicRepository: Send + Sync {
    /// Persist `event` unless the same user raised one less than `cooldown`
    /// before `event.created_at`. Check and insert are one atomic step per
    /// user.
    async fn insert_respecting_cooldown(
        &self,
        event: PanicEvent,
        cooldown: Duration,
    ) -> Result<PanicInsert>;

    async fn get(&self, id: PanicEventId) -> Result<Option<PanicEvent>>;

    async fn latest_for_user(&self, user_id: UserId)
    -> Result<Option<PanicEvent>>;
}
