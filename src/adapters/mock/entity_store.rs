use crate::domain::Entity;
use crate::ports::entity_store::{EntityStore as EntityStoreTrait, Result, StaleEntityError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory implementation of EntityStore
///
/// Enforces the same optimistic version check as the PostgreSQL adapters.
/// Updates for selected ids can be made to fail to exercise error paths.
pub struct EntityStore<E: Entity> {
    entities: Mutex<HashMap<E::Id, E>>,
    failing_updates: Mutex<HashSet<E::Id>>,
}

impl<E: Entity> EntityStore<E> {
    pub fn new() -> Self {
        Self {
            entities: Mutex::new(HashMap::new()),
            failing_updates: Mutex::new(HashSet::new()),
        }
    }

    /// Store an entity directly, bypassing the commit pipeline
    pub fn seed(&self, entity: E) {
        self.entities.lock().unwrap().insert(entity.id(), entity);
    }

    /// Make every subsequent update of `id` fail
    pub fn fail_updates_for(&self, id: E::Id) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    /// Snapshot of all stored entities
    pub fn all(&self) -> Vec<E> {
        self.entities.lock().unwrap().values().cloned().collect()
    }

    pub fn get(&self, id: E::Id) -> Option<E> {
        self.entities.lock().unwrap().get(&id).cloned()
    }
}

impl<E: Entity> Default for EntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> EntityStoreTrait<E> for EntityStore<E> {
    async fn insert(&self, entity: &E) -> Result<()> {
        let mut entities = self.entities.lock().unwrap();
        if entities.contains_key(&entity.id()) {
            return Err(format!("{} {} already exists", E::KIND, entity.id()).into());
        }
        entities.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &E) -> Result<()> {
        if self.failing_updates.lock().unwrap().contains(&entity.id()) {
            return Err(format!("simulated write failure for {} {}", E::KIND, entity.id()).into());
        }

        let mut entities = self.entities.lock().unwrap();
        let stored_version = entities.get(&entity.id()).map(Entity::version);
        if stored_version != Some(entity.version()) {
            return Err(Box::new(StaleEntityError {
                kind: E::KIND,
                id: entity.id().to_string(),
                expected_version: entity.version(),
            }));
        }

        let mut saved = entity.clone();
        saved.set_version(entity.version() + 1);
        entities.insert(entity.id(), saved);
        Ok(())
    }

    async fn get_by_id(&self, id: E::Id) -> Result<Option<E>> {
        Ok(self.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookId, MemberId, loan::{self, Loan}};
    use chrono::Utc;

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store: EntityStore<Loan> = EntityStore::new();
        let loan = loan::request_loan(BookId::new(), MemberId::new(), Utc::now());
        store.insert(&loan).await.unwrap();

        store.update(&loan).await.unwrap();

        let saved = store.get_by_id(loan.loan_id).await.unwrap().unwrap();
        assert_eq!(saved.version, 1);
    }

    #[tokio::test]
    async fn test_update_with_old_version_is_stale() {
        let store: EntityStore<Loan> = EntityStore::new();
        let loan = loan::request_loan(BookId::new(), MemberId::new(), Utc::now());
        store.insert(&loan).await.unwrap();
        store.update(&loan).await.unwrap();

        let err = store.update(&loan).await.unwrap_err();

        assert!(err.downcast_ref::<StaleEntityError>().is_some());
    }

    #[tokio::test]
    async fn test_insert_twice_fails() {
        let store: EntityStore<Loan> = EntityStore::new();
        let loan = loan::request_loan(BookId::new(), MemberId::new(), Utc::now());
        store.insert(&loan).await.unwrap();
        assert!(store.insert(&loan).await.is_err());
    }
}
