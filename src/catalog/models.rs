//! Diesel row types for the catalog store (spec.md §6).

use diesel::prelude::*;
use std::time::SystemTime;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::songs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Song {
    pub song_id: i32,
    pub song_name: String,
    pub file_sha1: String,
    pub fingerprinted: bool,
    pub created_at: Option<SystemTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::songs)]
pub struct NewSong<'a> {
    pub song_name: &'a str,
    pub file_sha1: &'a str,
    pub fingerprinted: bool,
    pub created_at: Option<SystemTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::fingerprints)]
pub struct NewFingerprint<'a> {
    pub song_id: i32,
    pub hash: &'a str,
    pub time_offset: i32,
    pub created_at: Option<SystemTime>,
}

/// Result row of the batch reverse-lookup join (spec.md §6 `return_matches`).
/// The teacher's own `fetch_matches_grouped_by_hash` references this shape
/// under the name `FingerprintMatch` but never defines it; this is that
/// missing definition, generalized to the varchar hash format.
#[derive(QueryableByName, Debug, Clone)]
pub struct FingerprintMatch {
    #[diesel(sql_type = diesel::sql_types::Int4)]
    pub song_id: i32,
    #[diesel(sql_type = diesel::sql_types::Int4)]
    pub time_offset: i32,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub hash: String,
}
