#![warn(unreachable_pub)]
#![warn(dead_code)]

pub mod anchor;
pub mod assemble;
pub mod bm25;
pub mod citation;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod expand;
pub mod extract;
pub mod heuristics;
pub mod preprocess;
pub mod quality;
pub mod rank;
pub mod segment;
pub mod tokenize;
pub mod types;

// Re-export common types
pub use config::{
    AnchorConfig, Bm25Config, DedupeConfig, ExcerptConfig, ExpandConfig, ExtractConfig,
    HeuristicWeights, QualityConfig, RankerConfig, RelevanceMode,
};
pub use error::ConfigError;
pub use extract::extract;
pub use tokenize::TokenizeOptions;
pub use types::{
    Block, BlockType, Chunk, Excerpt, ExtractionOutcome, ExtractionResult, RelevanceMetrics,
    ScoredSentence, Sentence,
};
