use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{ClientId, ClientProgress};
use super::repository::{PopulationScope, PopulationSnapshot, PopulationStore, StoreError};

#[derive(Debug, Default)]
struct Population {
    version: u64,
    clients: Vec<ClientProgress>,
}

/// Process-local store keeping clients in enrollment order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPopulationStore {
    inner: Arc<Mutex<Population>>,
}

impl InMemoryPopulationStore {
    pub fn seeded(clients: Vec<ClientProgress>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Population {
                version: 0,
                clients,
            })),
        }
    }

    pub fn version(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.version)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Population>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("population mutex poisoned".to_string()))
    }
}

impl PopulationStore for InMemoryPopulationStore {
    fn fetch_population(&self, scope: &PopulationScope) -> Result<PopulationSnapshot, StoreError> {
        let guard = self.lock()?;
        Ok(PopulationSnapshot {
            version: guard.version,
            clients: guard
                .clients
                .iter()
                .filter(|client| scope.includes(client))
                .cloned()
                .collect(),
        })
    }

    fn fetch_one(&self, id: &ClientId) -> Result<Option<ClientProgress>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.clients.iter().find(|client| &client.id == id).cloned())
    }

    fn write_back(
        &self,
        expected_version: u64,
        clients: Vec<ClientProgress>,
    ) -> Result<u64, StoreError> {
        let mut guard = self.lock()?;
        if guard.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: guard.version,
            });
        }

        for client in clients {
            match guard.clients.iter_mut().find(|stored| stored.id == client.id) {
                Some(stored) => *stored = client,
                None => guard.clients.push(client),
            }
        }
        guard.version += 1;
        Ok(guard.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::domain::AssociateId;
    use chrono::NaiveDate;

    fn client(id: &str, associate: &str) -> ClientProgress {
        ClientProgress::enroll(
            ClientId(id.to_string()),
            id.to_uppercase(),
            AssociateId(associate.to_string()),
            NaiveDate::from_ymd_opt(2025, 2, 3).expect("valid date"),
        )
    }

    #[test]
    fn write_back_rejects_stale_versions() {
        let store = InMemoryPopulationStore::seeded(vec![client("a", "g1")]);
        let snapshot = store
            .fetch_population(&PopulationScope::All)
            .expect("fetch succeeds");
        let version = store
            .write_back(snapshot.version, snapshot.clients.clone())
            .expect("first write succeeds");
        assert_eq!(version, 1);

        match store.write_back(snapshot.version, snapshot.clients) {
            Err(StoreError::VersionConflict { expected, actual }) => {
                assert_eq!((expected, actual), (0, 1));
            }
            other => panic!("expected version conflict, got {other:?}"),
        }
    }

    #[test]
    fn write_back_upserts_by_id_and_scope_filters() {
        let store = InMemoryPopulationStore::seeded(vec![client("a", "g1")]);
        let mut updated = client("a", "g1");
        updated.on_time_total = 4;
        store
            .write_back(0, vec![updated, client("b", "g2")])
            .expect("write succeeds");

        let all = store
            .fetch_population(&PopulationScope::All)
            .expect("fetch succeeds");
        assert_eq!(all.clients.len(), 2);
        assert_eq!(all.clients[0].on_time_total, 4);

        let scoped = store
            .fetch_population(&PopulationScope::Associate(AssociateId("g2".to_string())))
            .expect("fetch succeeds");
        assert_eq!(scoped.clients.len(), 1);
        assert_eq!(scoped.clients[0].id, ClientId("b".to_string()));
        assert!(store
            .fetch_one(&ClientId("missing".to_string()))
            .expect("fetch succeeds")
            .is_none());
    }
}
