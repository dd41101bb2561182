use super::domain::{AssociateId, ClientId, ClientProgress};

/// Which slice of the population a read should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationScope {
    All,
    Associate(AssociateId),
}

impl PopulationScope {
    pub fn for_associate(associate_id: Option<AssociateId>) -> Self {
        associate_id.map_or(Self::All, Self::Associate)
    }

    pub fn includes(&self, client: &ClientProgress) -> bool {
        match self {
            PopulationScope::All => true,
            PopulationScope::Associate(associate_id) => &client.associate_id == associate_id,
        }
    }
}

/// Population read together with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationSnapshot {
    pub version: u64,
    pub clients: Vec<ClientProgress>,
}

/// Storage abstraction for the leaderboard population.
///
/// `write_back` upserts records by id and is a compare-and-swap on the population
/// version: a store must refuse it when `expected_version` is not the current one.
pub trait PopulationStore: Send + Sync {
    fn fetch_population(&self, scope: &PopulationScope) -> Result<PopulationSnapshot, StoreError>;
    fn fetch_one(&self, id: &ClientId) -> Result<Option<ClientProgress>, StoreError>;
    fn write_back(
        &self,
        expected_version: u64,
        clients: Vec<ClientProgress>,
    ) -> Result<u64, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("client already exists")]
    Conflict,
    #[error("client not found")]
    NotFound,
    #[error("population changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("population store unavailable: {0}")]
    Unavailable(String),
}
