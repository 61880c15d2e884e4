//! The catalog store interface (spec.md §6): the boundary between the DSP
//! pipeline and whatever holds songs and fingerprints durably. `PgCatalog`
//! is the only implementation shipped, but matching/ingestion code only
//! ever depends on this trait.

pub mod models;
pub mod postgres;

use crate::error::CatalogError;
use std::collections::HashMap;

pub use models::Song;
pub use postgres::PgCatalog;

/// One stored landmark hash, as returned by `return_matches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPair {
    pub song_id: i32,
    pub time_offset: i32,
}

pub trait CatalogStore {
    /// Create the schema if it does not already exist. Idempotent.
    fn setup(&mut self) -> Result<(), CatalogError>;

    fn get_songs(&mut self) -> Result<Vec<Song>, CatalogError>;

    fn get_song_by_id(&mut self, song_id: i32) -> Result<Option<Song>, CatalogError>;

    /// Insert a new song row, unfingerprinted by default. Returns its id.
    fn insert_song(&mut self, song_name: &str, file_sha1: &str) -> Result<i32, CatalogError>;

    /// Bulk-insert `(hash, time_offset)` pairs for a song. Duplicates on
    /// `(song_id, hash, time_offset)` are silently dropped (spec.md §6).
    fn insert_hashes(
        &mut self,
        song_id: i32,
        hashes: &[(String, i32)],
    ) -> Result<usize, CatalogError>;

    fn set_song_fingerprinted(&mut self, song_id: i32) -> Result<(), CatalogError>;

    /// Remove a song row that was inserted but never reached the
    /// fingerprinted state (partial-ingest recovery, spec.md §9.1).
    fn delete_unfingerprinted_song(&mut self, song_id: i32) -> Result<(), CatalogError>;

    /// Look up a song by its content hash regardless of `fingerprinted`
    /// state, used to detect a partial prior ingest left behind by a crash
    /// between `insert_song` and `set_song_fingerprinted` (spec.md §9.1).
    fn find_song_by_sha1(&mut self, file_sha1: &str) -> Result<Option<Song>, CatalogError>;

    /// Reverse lookup: for each hash present in `hashes`, every
    /// `(song_id, time_offset)` pair stored against it. Free to reorder
    /// (spec.md §6) — callers group by hash themselves.
    fn return_matches(
        &mut self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<MatchPair>>, CatalogError>;
}
