//! Outcome - batch entry の終端結果

use std::sync::Arc;

use super::errors::FetchError;
use super::item::Item;
use super::state::EntryState;

/// What a request ended up as. Delivered exactly once to the request's
/// outcome callback.
///
/// A succeeded outcome shares its item with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Succeeded(Arc<Item>),
    Failed(FetchError),
    Canceled,
}

impl EntryOutcome {
    pub fn state(&self) -> EntryState {
        match self {
            EntryOutcome::Succeeded(_) => EntryState::Succeeded,
            EntryOutcome::Failed(_) => EntryState::Failed,
            EntryOutcome::Canceled => EntryState::Canceled,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match self {
            EntryOutcome::Succeeded(item) => Some(item.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            EntryOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Result<Item, FetchError>> for EntryOutcome {
    fn from(result: Result<Item, FetchError>) -> Self {
        match result {
            Ok(item) => EntryOutcome::Succeeded(Arc::new(item)),
            Err(err) => EntryOutcome::Failed(err),
        }
    }
}
