//! Error taxonomy. `EmptySignal` and `NoMatch` in spec.md §7 are not errors
//! here: they surface as an empty `Vec` and `Option::None` respectively, so
//! this enum only covers the cases that are actually exceptional.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open audio source: {0}")]
    Io(#[from] std::io::Error),

    #[error("no audio track found in source")]
    NoTrack,

    #[error("unsupported or corrupt codec parameters")]
    UnsupportedCodec,

    #[error("demuxer/probe error: {0}")]
    Format(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("connection to catalog store failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("song {0} not found")]
    SongNotFound(i32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
