//! # DeepRead Core
//!
//! Core library for the DeepRead research assistant.
//! Provides the record types, provider response parsers, HTTP provider
//! clients, credential storage, configuration, report assembly and the
//! research session that ties them together.

pub mod config;
pub mod credentials;
pub mod error;
pub mod parsing;
pub mod providers;
pub mod research;
pub mod types;

// Re-export commonly used types at the crate root.
pub use config::{DeepReadConfig, load_config};
pub use credentials::{
    CredentialStore, InMemoryCredentialStore, KeyringCredentialStore, resolve_generation_key,
};
pub use error::{AnalysisError, DeepReadError, ProviderError, ResearchError, Result};
pub use parsing::{
    SearchResponseParser, extract_bullets, extract_section, parse_reader_response,
    parse_search_response,
};
pub use providers::{
    GenerationProvider, HttpReaderProvider, HttpSearchProvider, OpenAiGenerationProvider,
    ReaderProvider, SearchProvider,
};
pub use research::{ResearchReportAssembler, ResearchSession, Settled};
pub use types::{
    DocumentCollection, DocumentRecord, ReportMode, ReportRecord, SearchResultRecord,
};
