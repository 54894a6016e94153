/* src/history/mod.rs */

mod backend;
mod migrate;
mod record;
mod store;
mod streak;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use migrate::{LegacyFit, Migration, decode_data_url};
pub use record::{MAX_MESSAGE_CHARS, SavedFit};
pub use store::{HistoryKeys, HistoryStore};
pub use streak::current_streak;
