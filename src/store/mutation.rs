use std::future::Future;

use tracing::warn;

use crate::errors::AppError;
use crate::store::collection::{PersistedCollection, Record};

/// A structural change to a collection, kept so it can be undone.
///
/// Collections return one of these from every structural mutation; callers that also
/// persist remotely roll it back when the remote write fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T: Record> {
    Insert(T),
    Replace { previous: T, next: T },
    Delete { previous: T, index: usize },
}

impl<T: Record> Mutation<T> {
    /// The record as it looks after the mutation (the removed record for deletes).
    pub fn record(&self) -> &T {
        match self {
            Mutation::Insert(item) => item,
            Mutation::Replace { next, .. } => next,
            Mutation::Delete { previous, .. } => previous,
        }
    }

    /// Re-apply onto `collection`, e.g. after a rollback.
    pub fn apply(&self, collection: &PersistedCollection<T>) -> Result<(), AppError> {
        match self {
            Mutation::Insert(item) => collection.insert(item.clone()).map(|_| ()),
            Mutation::Replace { next, .. } => {
                if collection.put(next.clone()) {
                    Ok(())
                } else {
                    Err(AppError::NotFound)
                }
            }
            Mutation::Delete { previous, .. } => collection.remove(&previous.key()).map(|_| ()),
        }
    }

    pub fn rollback(&self, collection: &PersistedCollection<T>) {
        match self {
            Mutation::Insert(item) => {
                collection.discard(&item.key());
            }
            Mutation::Replace { previous, .. } => collection.put_reconciled(previous.clone()),
            Mutation::Delete { previous, index } => collection.restore_at(*index, previous.clone()),
        }
    }
}

/// Keep `mutation` if `persist` succeeds, otherwise undo it and report a persistence error.
pub async fn commit_or_rollback<T, F, Fut>(
    mutation: Mutation<T>,
    collection: &PersistedCollection<T>,
    persist: F,
) -> Result<Mutation<T>, AppError>
where
    T: Record,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    match persist().await {
        Ok(()) => Ok(mutation),
        Err(e) => {
            warn!(
                "Remote write for {} {} failed, rolling back: {}",
                collection.name(),
                mutation.record().key(),
                e
            );
            mutation.rollback(collection);
            Err(AppError::Persistence(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        text: String,
    }

    impl Record for Note {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn notes() -> PersistedCollection<Note> {
        let collection = PersistedCollection::new("notes", Arc::new(MemoryStorage::new()));
        for (id, text) in [(1, "a"), (2, "b"), (3, "c")] {
            collection.insert(Note { id, text: text.into() }).unwrap();
        }
        collection
    }

    #[test]
    fn test_rollback_delete_restores_original_position() {
        let collection = notes();
        let mutation = collection.remove(&2).unwrap();

        mutation.rollback(&collection);

        let ids: Vec<u32> = collection.snapshot().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_rollback_replace_and_reapply() {
        let collection = notes();
        let mutation = collection
            .update(&1, |n| {
                n.text = "edited".into();
                Ok(())
            })
            .unwrap();

        mutation.rollback(&collection);
        assert_eq!(collection.get(&1).unwrap().text, "a");

        mutation.apply(&collection).unwrap();
        assert_eq!(collection.get(&1).unwrap().text, "edited");
    }

    #[tokio::test]
    async fn test_commit_or_rollback_undoes_insert_on_failure() {
        let collection = notes();
        let mutation = collection.insert(Note { id: 9, text: "z".into() }).unwrap();

        let result = commit_or_rollback(mutation, &collection, || async {
            Err(AppError::External("backend down".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert!(!collection.contains(&9));
        assert_eq!(collection.len(), 3);
    }

    #[tokio::test]
    async fn test_commit_or_rollback_keeps_mutation_on_success() {
        let collection = notes();
        let mutation = collection.remove(&3).unwrap();

        let kept = commit_or_rollback(mutation, &collection, || async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(kept.record().id, 3);
        assert!(!collection.contains(&3));
    }
}
