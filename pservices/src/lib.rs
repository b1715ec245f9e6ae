//! Collaborator contracts used by the parley dialog engine.
//!
//! The engine treats intent classification, knowledge lookup, image tagging,
//! car-type classification, sentiment scoring, and attachment download as black-box request/response
//! operations. This crate defines those contracts, a shared error type, call
//! observation hooks, deterministic in-process implementations, and (behind
//! the `http` feature) reqwest adapters for hosted services.
//!
//! ```rust
//! use pservices::{IntentResult, ServiceError, ServiceErrorKind};
//!
//! let result = IntentResult::new("i need car insurance", "INeedInsurance", 0.97)
//!     .with_entity("InsuranceType", "Car");
//! assert_eq!(result.entity("InsuranceType"), Some("Car"));
//!
//! let error = ServiceError::unavailable("vision endpoint is down");
//! assert_eq!(error.kind, ServiceErrorKind::Unavailable);
//! ```

pub mod credentials;
pub mod error;
pub mod fixed;
pub mod observe;
pub mod service;
pub mod types;

#[cfg(feature = "http")]
pub mod adapters;

pub use credentials::SecretString;
pub use error::{ServiceError, ServiceErrorKind};
pub use fixed::{
    InMemoryAttachmentLoader, StaticCarTypeClassifier, StaticImageTagger, StaticIntentClassifier,
    StaticKnowledgeBase, StaticSentimentScorer,
};
pub use observe::{NoopOperationHooks, ServiceOperationHooks, observe_once};
pub use service::{
    AttachmentLoader, CarTypeClassifier, ImageTagger, IntentClassifier, KnowledgeBase,
    NoopAttachmentLoader, SentimentScorer, ServiceFuture,
};
pub use types::{
    CarTypePrediction, ImageAnalysis, IntentResult, KbAnswer, ServiceId, top_car_type,
};

pub mod prelude {
    pub use crate::{
        AttachmentLoader, CarTypeClassifier, CarTypePrediction, ImageAnalysis, ImageTagger,
        IntentClassifier, IntentResult, KbAnswer, KnowledgeBase, SecretString, SentimentScorer,
        ServiceError, ServiceErrorKind, ServiceId, ServiceOperationHooks,
    };
}
