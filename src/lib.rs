//! Acoustic fingerprinting engine: decode audio, extract landmark hashes,
//! store and match them against a catalog of known songs.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod dsp;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod schema;

use audio::{decode_file, decode_file_limited};
use catalog::{CatalogStore, PgCatalog};
use config::Config;
use dsp::{find_peaks, generate_hashes, spectrogram, HashRecord};
use error::EngineError;
use ingest::IngestReport;
use matcher::MatchResult;
use std::path::Path;

/// Top-level entry point wiring config, catalog and the DSP pipeline together.
pub struct Engine {
    catalog: PgCatalog,
    sample_rate: u32,
    /// Seconds per track to ingest; `None` means the full track
    /// (spec.md §6 `fingerprint_limit`).
    fingerprint_limit: Option<u32>,
}

impl Engine {
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        let mut catalog = PgCatalog::connect(&config.database_url)?;
        catalog.setup()?;
        Ok(Self {
            catalog,
            sample_rate: config.target_sample_rate,
            fingerprint_limit: config.fingerprint_limit,
        })
    }

    /// Fingerprint and store a single audio file. Returns the new song id,
    /// or `Ok(None)` if a song with this file's content hash is already
    /// fully indexed. `song_name` defaults to the file stem when `None`
    /// (dejavu's `path_to_songname`, spec.md §3 supplement).
    pub fn fingerprint_file(
        &mut self,
        path: &Path,
        song_name: Option<&str>,
    ) -> Result<Option<i32>, EngineError> {
        let decoded = decode_file_limited(path, self.fingerprint_limit)?;

        if let Some(existing) = self.catalog.find_song_by_sha1(&decoded.content_sha1)? {
            if existing.fingerprinted {
                return Ok(None);
            }
            // Partial prior ingest (spec.md §9.1): delete and re-run from scratch.
            self.catalog.delete_unfingerprinted_song(existing.song_id)?;
        }

        let mut hashes: Vec<(String, i32)> = Vec::new();
        for channel in &decoded.channels {
            let spec = spectrogram(channel, decoded.sample_rate);
            for record in generate_hashes(&find_peaks(&spec)) {
                hashes.push((record.hash, record.anchor_time as i32));
            }
        }
        hashes.sort();
        hashes.dedup();

        let song_name = song_name.map(str::to_string).unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string()
        });

        let song_id = self.catalog.insert_song(&song_name, &decoded.content_sha1)?;
        self.catalog.insert_hashes(song_id, &hashes)?;
        self.catalog.set_song_fingerprinted(song_id)?;

        Ok(Some(song_id))
    }

    /// Walk `root` and fingerprint every new file under a supported
    /// extension. `extensions` defaults to [`ingest::DEFAULT_EXTENSIONS`]
    /// and `parallelism` to the CPU count (floor 1) when `None`.
    pub fn fingerprint_directory(
        &mut self,
        root: &Path,
        extensions: Option<&[&str]>,
        parallelism: Option<usize>,
    ) -> Result<IngestReport, EngineError> {
        Ok(ingest::ingest_directory(
            &mut self.catalog,
            root,
            extensions,
            parallelism,
            self.fingerprint_limit,
        )?)
    }

    /// Recognize a raw mono sample buffer (e.g. a microphone capture)
    /// against the catalog.
    pub fn recognize_samples(&mut self, samples: &[i16]) -> Result<Option<MatchResult>, EngineError> {
        let spec = spectrogram(samples, self.sample_rate);
        let peaks = find_peaks(&spec);
        let hashes: Vec<HashRecord> = generate_hashes(&peaks);
        Ok(matcher::align(&mut self.catalog, &hashes, self.sample_rate)?)
    }

    pub fn recognize_file(&mut self, path: &Path) -> Result<Option<MatchResult>, EngineError> {
        let decoded = decode_file(path)?;
        let Some(channel) = decoded.channels.first() else {
            return Ok(None);
        };
        let spec = spectrogram(channel, decoded.sample_rate);
        let peaks = find_peaks(&spec);
        let hashes = generate_hashes(&peaks);
        Ok(matcher::align(&mut self.catalog, &hashes, decoded.sample_rate)?)
    }
}
