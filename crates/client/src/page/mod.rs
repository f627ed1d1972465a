//! The page side: cache queries, row construction and the favicon loader.

pub mod crossfade;
pub mod loader;
pub mod origin;
pub mod query;
pub mod row;
pub mod surface;

pub use crossfade::{Attempt, Crossfade, CrossfadeEvent, CrossfadeState, DegradeReason, Settlement, TransitionError};
pub use loader::{FaviconLoader, FaviconRowState, IconSurface, LoadOutcome, LoaderConfig};
pub use origin::RowTarget;
pub use query::{CacheAnswer, CacheQueryClient, ControllerSlot};
pub use row::{Bang, BangRow, RowLink};
pub use surface::FetchSurface;
