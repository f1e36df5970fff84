//! Domain - ドメインモデル（ids, item, request, state, outcome, events, errors）

pub mod errors;
pub mod events;
pub mod ids;
pub mod item;
pub mod outcome;
pub mod request;
pub mod state;

pub use self::errors::FetchError;
pub use self::events::{EventKind, StoreEvent};
pub use self::ids::{BatchId, ListenerId};
pub use self::item::{Item, Source};
pub use self::outcome::EntryOutcome;
pub use self::request::{FetchRequest, OutcomeCallback};
pub use self::state::EntryState;
