//! Collaborator traits invoked by validators, flow steps, and the turn router.

use pcommon::BoxFuture;

use crate::{CarTypePrediction, ImageAnalysis, IntentResult, KbAnswer, ServiceError};

pub type ServiceFuture<'a, T> = BoxFuture<'a, T>;

pub trait IntentClassifier: Send + Sync {
    fn classify<'a>(
        &'a self,
        utterance: &'a str,
    ) -> ServiceFuture<'a, Result<IntentResult, ServiceError>>;
}

/// Ranked canned-answer lookup. An empty vector means no usable answer.
pub trait KnowledgeBase: Send + Sync {
    fn query<'a>(&'a self, utterance: &'a str)
    -> ServiceFuture<'a, Result<Vec<KbAnswer>, ServiceError>>;
}

pub trait ImageTagger: Send + Sync {
    fn analyze<'a>(&'a self, image: &'a [u8])
    -> ServiceFuture<'a, Result<ImageAnalysis, ServiceError>>;
}

/// Scores an image against a fixed set of car-type tags.
pub trait CarTypeClassifier: Send + Sync {
    fn predict<'a>(
        &'a self,
        image: &'a [u8],
    ) -> ServiceFuture<'a, Result<Vec<CarTypePrediction>, ServiceError>>;
}

/// Returns a score in `[0, 1]`; lower is more negative.
pub trait SentimentScorer: Send + Sync {
    fn score<'a>(&'a self, text: &'a str) -> ServiceFuture<'a, Result<f64, ServiceError>>;
}

pub trait AttachmentLoader: Send + Sync {
    fn load<'a>(&'a self, url: &'a str) -> ServiceFuture<'a, Result<Vec<u8>, ServiceError>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAttachmentLoader;

impl AttachmentLoader for NoopAttachmentLoader {
    fn load<'a>(&'a self, url: &'a str) -> ServiceFuture<'a, Result<Vec<u8>, ServiceError>> {
        Box::pin(async move {
            Err(ServiceError::invalid_request(format!(
                "attachment download is not configured (url: {url})"
            )))
        })
    }
}
