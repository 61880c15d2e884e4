//! Matching: turn a query's landmark hashes into a ranked guess at which
//! catalog song, and at what offset, they came from (spec.md §5).

use crate::catalog::{CatalogStore, MatchPair};
use crate::dsp::{offset_seconds, HashRecord};
use crate::error::CatalogError;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MatchResult {
    pub song_id: i32,
    pub song_name: String,
    pub file_sha1: String,
    /// Number of query hashes that voted for the winning `(song_id, delta)` bin.
    pub confidence: usize,
    /// Winning time-bin delta (query anchor time minus catalog anchor time).
    pub offset: i64,
    pub offset_seconds: f64,
}

/// Align `query_hashes` against the catalog and return the single best
/// match, or `None` if no query hash has any stored counterpart (spec.md §5,
/// the `NoMatch` case — not an error, so no `Result` wrapper here).
pub fn align(
    catalog: &mut dyn CatalogStore,
    query_hashes: &[HashRecord],
    fs: u32,
) -> Result<Option<MatchResult>, CatalogError> {
    if query_hashes.is_empty() {
        return Ok(None);
    }

    let hash_strings: Vec<String> = query_hashes.iter().map(|h| h.hash.clone()).collect();
    let matches = catalog.return_matches(&hash_strings)?;

    // (delta, song_id) -> running vote count. The running max is tracked
    // inline as each pair is consumed: increment the bin, then immediately
    // compare the *just-updated* count against the current best with strict
    // `>` (spec.md §4.4/§9). This is the streaming argmax the spec requires —
    // a second pass over final tallies would let a later key that reaches
    // the same count as an earlier one wrongly displace it.
    let mut counts: HashMap<(i64, i32), usize> = HashMap::new();
    let mut best: Option<((i64, i32), usize)> = None;

    for query in query_hashes {
        let Some(pairs) = matches.get(&query.hash) else {
            continue;
        };
        for MatchPair { song_id, time_offset } in pairs {
            let key = (*time_offset as i64 - query.anchor_time as i64, *song_id);
            let entry = counts.entry(key).or_insert(0);
            *entry += 1;
            let count = *entry;

            let is_better = match best {
                None => true,
                Some((_, best_count)) => count > best_count,
            };
            if is_better {
                best = Some((key, count));
            }
        }
    }

    let Some(((delta, song_id), confidence)) = best else {
        return Ok(None);
    };

    let song = catalog
        .get_song_by_id(song_id)?
        .ok_or(CatalogError::SongNotFound(song_id))?;

    Ok(Some(MatchResult {
        song_id,
        song_name: song.song_name,
        file_sha1: song.file_sha1,
        confidence,
        offset: delta,
        offset_seconds: offset_seconds(delta, fs),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Song;
    use std::collections::HashMap as Map;
    use std::time::SystemTime;

    struct FakeCatalog {
        songs: Map<i32, Song>,
        matches: Map<String, Vec<MatchPair>>,
    }

    impl CatalogStore for FakeCatalog {
        fn setup(&mut self) -> Result<(), CatalogError> {
            Ok(())
        }
        fn get_songs(&mut self) -> Result<Vec<Song>, CatalogError> {
            Ok(self.songs.values().cloned().collect())
        }
        fn get_song_by_id(&mut self, song_id: i32) -> Result<Option<Song>, CatalogError> {
            Ok(self.songs.get(&song_id).cloned())
        }
        fn insert_song(&mut self, _: &str, _: &str) -> Result<i32, CatalogError> {
            unimplemented!()
        }
        fn insert_hashes(&mut self, _: i32, _: &[(String, i32)]) -> Result<usize, CatalogError> {
            unimplemented!()
        }
        fn set_song_fingerprinted(&mut self, _: i32) -> Result<(), CatalogError> {
            unimplemented!()
        }
        fn delete_unfingerprinted_song(&mut self, _: i32) -> Result<(), CatalogError> {
            unimplemented!()
        }
        fn find_song_by_sha1(&mut self, _: &str) -> Result<Option<Song>, CatalogError> {
            unimplemented!()
        }
        fn return_matches(
            &mut self,
            hashes: &[String],
        ) -> Result<Map<String, Vec<MatchPair>>, CatalogError> {
            Ok(hashes
                .iter()
                .filter_map(|h| self.matches.get(h).map(|v| (h.clone(), v.clone())))
                .collect())
        }
    }

    fn song(id: i32, name: &str) -> Song {
        Song {
            song_id: id,
            song_name: name.to_string(),
            file_sha1: format!("sha1-{id}"),
            fingerprinted: true,
            created_at: Some(SystemTime::now()),
        }
    }

    #[test]
    fn no_matches_returns_none() {
        let mut catalog = FakeCatalog {
            songs: Map::new(),
            matches: Map::new(),
        };
        let hashes = vec![HashRecord { hash: "abc".into(), anchor_time: 0 }];
        assert!(align(&mut catalog, &hashes, 44100).unwrap().is_none());
    }

    #[test]
    fn empty_query_returns_none_without_touching_catalog() {
        let mut catalog = FakeCatalog {
            songs: Map::new(),
            matches: Map::new(),
        };
        assert!(align(&mut catalog, &[], 44100).unwrap().is_none());
    }

    #[test]
    fn song_with_most_consistent_offset_wins() {
        let mut songs = Map::new();
        songs.insert(1, song(1, "song-one"));
        songs.insert(2, song(2, "song-two"));

        let mut matches = Map::new();
        // Query anchor_time=10 for hash "h1": catalog has it at time_offset=20 for
        // song 1 (delta=10) twice over, and at time_offset=100 for song 2 once.
        matches.insert(
            "h1".to_string(),
            vec![
                MatchPair { song_id: 1, time_offset: 20 },
                MatchPair { song_id: 2, time_offset: 100 },
            ],
        );
        matches.insert(
            "h2".to_string(),
            vec![MatchPair { song_id: 1, time_offset: 30 }],
        );

        let mut catalog = FakeCatalog { songs, matches };
        let hashes = vec![
            HashRecord { hash: "h1".into(), anchor_time: 10 },
            HashRecord { hash: "h2".into(), anchor_time: 20 },
        ];

        let result = align(&mut catalog, &hashes, 44100).unwrap().unwrap();
        assert_eq!(result.song_id, 1);
        assert_eq!(result.offset, 10);
        assert_eq!(result.confidence, 2);
    }

    #[test]
    fn unmatched_query_hashes_are_ignored() {
        let mut songs = Map::new();
        songs.insert(1, song(1, "only-song"));
        let mut matches = Map::new();
        matches.insert("h1".to_string(), vec![MatchPair { song_id: 1, time_offset: 5 }]);

        let mut catalog = FakeCatalog { songs, matches };
        let hashes = vec![
            HashRecord { hash: "h1".into(), anchor_time: 0 },
            HashRecord { hash: "unknown".into(), anchor_time: 0 },
        ];

        let result = align(&mut catalog, &hashes, 44100).unwrap().unwrap();
        assert_eq!(result.song_id, 1);
        assert_eq!(result.confidence, 1);
    }
}
