//! reqwest-based clients for hosted cognitive services.
//!
//! Every adapter shares one [`HttpServiceClient`], which owns the reqwest
//! client and its timeout. Adapters make one request per call; callers wrap
//! them with [`observe_once`](crate::observe_once) to report outcomes.

mod client;
mod serde_api;

pub mod attachment;
pub mod car_type;
pub mod intent;
pub mod knowledge;
pub mod sentiment;
pub mod vision;

pub use attachment::HttpAttachmentLoader;
pub use car_type::CustomVisionCarTypeClassifier;
pub use client::{HttpEndpoint, HttpServiceClient};
pub use intent::LuisIntentClassifier;
pub use knowledge::QnaKnowledgeBase;
pub use sentiment::TextAnalyticsSentimentScorer;
pub use vision::ComputerVisionImageTagger;
