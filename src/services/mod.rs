//! Business logic services.
//!
//! Orchestrators compose the storage traits from [`crate::store`] with the
//! reviewer selection rules in [`assignment`]. They hold no state of their own
//! and are independent of the HTTP layer.

pub mod assignment;
pub mod pr_service;
pub mod stats_service;
pub mod team_service;
pub mod user_service;

use std::sync::Arc;

use crate::store::{PrStore, StatsStore, TeamStore, UserStore};

pub use assignment::AssignmentPolicy;
pub use pr_service::{PrService, Reassignment};
pub use stats_service::StatsService;
pub use team_service::TeamService;
pub use user_service::UserService;

/// All orchestrators wired over one store.
#[derive(Clone)]
pub struct Services {
    pub teams: Arc<TeamService>,
    pub users: Arc<UserService>,
    pub prs: Arc<PrService>,
    pub stats: Arc<StatsService>,
}

impl Services {
    pub fn new<S>(store: Arc<S>, policy: AssignmentPolicy) -> Self
    where
        S: TeamStore + UserStore + PrStore + StatsStore + 'static,
    {
        let teams: Arc<dyn TeamStore> = store.clone();
        let users: Arc<dyn UserStore> = store.clone();
        let prs: Arc<dyn PrStore> = store.clone();
        let stats: Arc<dyn StatsStore> = store;

        Self {
            teams: Arc::new(TeamService::new(
                teams,
                users.clone(),
                prs.clone(),
                policy,
            )),
            users: Arc::new(UserService::new(users.clone(), prs.clone())),
            prs: Arc::new(PrService::new(prs, users, policy)),
            stats: Arc::new(StatsService::new(stats)),
        }
    }
}
