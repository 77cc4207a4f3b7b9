use std::{fmt, sync::Arc};

use chrono::{FixedOffset, Local, Offset};
use fleetward_core::{
    AppUnitOfWork,
    domain::{
        location::LocationReconciler, manifest::ManifestLedger,
        panic::PanicCoordinator,
    },
    notify::{MessageTransport, NotificationDispatcher},
    time::Clock,
    tracking::TrackingProvider,
};

use crate::infra::config::{Config, LedgerConfig};

/// Which adapter backs the unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Postgres,
    Memory,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Postgres => "postgres",
            StorageMode::Memory => "memory",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub unit_of_work: Arc<AppUnitOfWork>,
    pub storage: StorageMode,
    pub ledger: ManifestLedger,
    pub locations: LocationReconciler,
    pub panics: PanicCoordinator,
    pub notifier: NotificationDispatcher,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("storage", &self.storage)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

/// Everything [`AppState::assemble`] needs beyond the configuration.
pub struct AppDependencies {
    pub unit_of_work: AppUnitOfWork,
    pub storage: StorageMode,
    pub transport: Arc<dyn MessageTransport>,
    pub tracking: Option<Arc<dyn TrackingProvider>>,
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for AppDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppDependencies")
            .field("storage", &self.storage)
            .field("transport", &self.transport.label())
            .field("tracking", &self.tracking.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}

impl AppState {
    /// Starts the notification workers on the current runtime.
    pub fn assemble(config: Config, deps: AppDependencies) -> Self {
        let AppDependencies {
            unit_of_work,
            storage,
            transport,
            tracking,
            clock,
        } = deps;

        let notifier = NotificationDispatcher::start(
            transport,
            config.notifications.dispatcher(),
        );

        let ledger =
            ManifestLedger::new(&unit_of_work, notifier.clone(), Arc::clone(&clock))
                .with_offset(ledger_offset(&config.ledger));

        let mut locations = LocationReconciler::new(
            Arc::clone(&unit_of_work.vehicles),
            Arc::clone(&unit_of_work.locations),
            Arc::clone(&clock),
        );
        if let Some(provider) = tracking {
            locations = locations.with_provider(provider);
        }

        let panics = PanicCoordinator::new(&unit_of_work, notifier.clone(), clock)
            .with_emergency_contacts(config.alerts.emergency_contacts.clone());

        Self {
            config: Arc::new(config),
            unit_of_work: Arc::new(unit_of_work),
            storage,
            ledger,
            locations,
            panics,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Configured offset, else the host's local offset right now.
pub fn ledger_offset(ledger: &LedgerConfig) -> FixedOffset {
    ledger
        .fixed_offset()
        .unwrap_or_else(|| Local::now().offset().fix())
}
