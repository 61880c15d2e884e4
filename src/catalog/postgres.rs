//! Postgres-backed `CatalogStore`, generalizing the teacher's `DB` connector
//! (batched inserts via `on_conflict().do_nothing()`, a temp-table join for
//! the reverse hash lookup) to the spec's varchar hash and song schema.

use super::models::{FingerprintMatch, NewFingerprint, NewSong, Song};
use super::{CatalogStore, MatchPair};
use crate::error::CatalogError;
use crate::schema::{fingerprints, songs};
use diesel::prelude::*;
use diesel::{dsl::insert_into, upsert::on_constraint, RunQueryDsl};
use std::collections::HashMap;
use std::time::SystemTime;
use tracing::{debug, info};

/// Hashes are inserted in chunks this large to stay well under Postgres'
/// per-statement bind-parameter limit, matching the teacher's own batching.
const INSERT_BATCH_SIZE: usize = 5_000;

pub struct PgCatalog {
    conn: PgConnection,
}

impl PgCatalog {
    pub fn connect(database_url: &str) -> Result<Self, CatalogError> {
        let conn = PgConnection::establish(database_url)
            .map_err(|e| CatalogError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl CatalogStore for PgCatalog {
    fn setup(&mut self) -> Result<(), CatalogError> {
        diesel::sql_query(
            "CREATE TABLE IF NOT EXISTS songs (
                song_id SERIAL PRIMARY KEY,
                song_name VARCHAR(255) NOT NULL,
                file_sha1 VARCHAR(40) NOT NULL UNIQUE,
                fingerprinted BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP
            )",
        )
        .execute(&mut self.conn)?;

        diesel::sql_query(
            "CREATE TABLE IF NOT EXISTS fingerprints (
                song_id INTEGER NOT NULL REFERENCES songs(song_id),
                hash VARCHAR(20) NOT NULL,
                time_offset INTEGER NOT NULL,
                created_at TIMESTAMP,
                PRIMARY KEY (song_id, hash, time_offset)
            )",
        )
        .execute(&mut self.conn)?;

        diesel::sql_query("CREATE INDEX IF NOT EXISTS fingerprints_hash_idx ON fingerprints (hash)")
            .execute(&mut self.conn)?;

        Ok(())
    }

    fn get_songs(&mut self) -> Result<Vec<Song>, CatalogError> {
        Ok(songs::table.load(&mut self.conn)?)
    }

    fn get_song_by_id(&mut self, song_id_val: i32) -> Result<Option<Song>, CatalogError> {
        Ok(songs::table
            .filter(songs::song_id.eq(song_id_val))
            .first(&mut self.conn)
            .optional()?)
    }

    fn insert_song(&mut self, song_name_val: &str, file_sha1_val: &str) -> Result<i32, CatalogError> {
        let new_song = NewSong {
            song_name: song_name_val,
            file_sha1: file_sha1_val,
            fingerprinted: false,
            created_at: Some(SystemTime::now()),
        };

        let inserted: Song = insert_into(songs::table)
            .values(&new_song)
            .get_result(&mut self.conn)?;

        debug!(song_id = inserted.song_id, song_name = song_name_val, "inserted song");
        Ok(inserted.song_id)
    }

    fn insert_hashes(
        &mut self,
        song_id_val: i32,
        hashes: &[(String, i32)],
    ) -> Result<usize, CatalogError> {
        if hashes.is_empty() {
            return Ok(0);
        }

        let rows: Vec<NewFingerprint> = hashes
            .iter()
            .map(|(hash, time_offset)| NewFingerprint {
                song_id: song_id_val,
                hash: hash.as_str(),
                time_offset: *time_offset,
                created_at: Some(SystemTime::now()),
            })
            .collect();

        let mut total = 0;
        self.conn.transaction(|conn| {
            for batch in rows.chunks(INSERT_BATCH_SIZE) {
                total += insert_into(fingerprints::table)
                    .values(batch)
                    .on_conflict(on_constraint("fingerprints_pkey"))
                    .do_nothing()
                    .execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(())
        })?;

        info!(song_id = song_id_val, inserted = total, "inserted fingerprints");
        Ok(total)
    }

    fn set_song_fingerprinted(&mut self, song_id_val: i32) -> Result<(), CatalogError> {
        diesel::update(songs::table.filter(songs::song_id.eq(song_id_val)))
            .set(songs::fingerprinted.eq(true))
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn delete_unfingerprinted_song(&mut self, song_id_val: i32) -> Result<(), CatalogError> {
        diesel::delete(
            songs::table
                .filter(songs::song_id.eq(song_id_val))
                .filter(songs::fingerprinted.eq(false)),
        )
        .execute(&mut self.conn)?;
        Ok(())
    }

    fn find_song_by_sha1(&mut self, file_sha1_val: &str) -> Result<Option<Song>, CatalogError> {
        Ok(songs::table
            .filter(songs::file_sha1.eq(file_sha1_val))
            .first(&mut self.conn)
            .optional()?)
    }

    fn return_matches(
        &mut self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<MatchPair>>, CatalogError> {
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<FingerprintMatch> = self.conn.transaction(|conn| {
            diesel::sql_query(
                "CREATE TEMPORARY TABLE temp_query_hashes (hash VARCHAR(20) NOT NULL PRIMARY KEY) ON COMMIT DROP",
            )
            .execute(conn)?;

            diesel::table! {
                temp_query_hashes (hash) {
                    hash -> Varchar,
                }
            }

            #[derive(Insertable)]
            #[diesel(table_name = temp_query_hashes)]
            struct NewTempHash<'a> {
                hash: &'a str,
            }

            for batch in hashes.chunks(INSERT_BATCH_SIZE) {
                let new_hashes: Vec<NewTempHash> =
                    batch.iter().map(|h| NewTempHash { hash: h.as_str() }).collect();
                diesel::insert_into(temp_query_hashes::table)
                    .values(&new_hashes)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }

            diesel::sql_query(
                "SELECT f.song_id, f.time_offset, f.hash
                 FROM fingerprints AS f
                 INNER JOIN temp_query_hashes AS t ON f.hash = t.hash",
            )
            .load::<FingerprintMatch>(conn)
        })?;

        let mut grouped: HashMap<String, Vec<MatchPair>> = HashMap::new();
        for row in rows {
            grouped.entry(row.hash).or_default().push(MatchPair {
                song_id: row.song_id,
                time_offset: row.time_offset,
            });
        }
        Ok(grouped)
    }
}
