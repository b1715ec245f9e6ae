//! The collaborator set the bot and its flows call into.

use std::sync::Arc;

use pservices::{
    AttachmentLoader, CarTypeClassifier, ImageTagger, IntentClassifier, KnowledgeBase,
    NoopAttachmentLoader, NoopOperationHooks, SentimentScorer, ServiceOperationHooks,
};

#[derive(Clone)]
pub struct BotServices {
    pub intent: Arc<dyn IntentClassifier>,
    pub knowledge: Arc<dyn KnowledgeBase>,
    pub image_tagger: Arc<dyn ImageTagger>,
    pub sentiment: Arc<dyn SentimentScorer>,
    pub attachments: Arc<dyn AttachmentLoader>,
    /// Optional body-style check for uploaded car pictures.
    pub car_type: Option<Arc<dyn CarTypeClassifier>>,
    pub hooks: Arc<dyn ServiceOperationHooks>,
}

impl BotServices {
    pub fn new(
        intent: Arc<dyn IntentClassifier>,
        knowledge: Arc<dyn KnowledgeBase>,
        image_tagger: Arc<dyn ImageTagger>,
        sentiment: Arc<dyn SentimentScorer>,
    ) -> Self {
        Self {
            intent,
            knowledge,
            image_tagger,
            sentiment,
            attachments: Arc::new(NoopAttachmentLoader),
            car_type: None,
            hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn with_attachment_loader(mut self, attachments: Arc<dyn AttachmentLoader>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_car_type_classifier(mut self, classifier: Arc<dyn CarTypeClassifier>) -> Self {
        self.car_type = Some(classifier);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ServiceOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }
}

impl std::fmt::Debug for BotServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotServices").finish_non_exhaustive()
    }
}
