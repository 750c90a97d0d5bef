pub mod counters;
pub mod likes;
pub mod memory;
pub mod posts;
pub mod profiles;
pub mod traits;

pub use counters::PgCounterStore;
pub use likes::PgLikeLedger;
pub use memory::MemoryStore;
pub use posts::PgPostRepository;
pub use profiles::PgProfileDirectory;
pub use traits::{
    CounterError, CounterStore, LedgerError, LikeLedger, PostRepository, ProfileDirectory,
    StoreError,
};
