use std::sync::{Arc, Mutex};
use std::time::Duration;

use pservices::{
    CarTypeClassifier, ImageTagger, IntentClassifier, IntentResult, KnowledgeBase,
    SentimentScorer, ServiceError, ServiceErrorKind, ServiceFuture, ServiceId,
    ServiceOperationHooks, StaticCarTypeClassifier, StaticImageTagger, StaticIntentClassifier,
    StaticKnowledgeBase, StaticSentimentScorer, observe_once, top_car_type,
};

#[derive(Debug, Default)]
struct FlakyScorer {
    failures_left: Mutex<u32>,
    calls: Mutex<u32>,
}

impl SentimentScorer for FlakyScorer {
    fn score<'a>(&'a self, _text: &'a str) -> ServiceFuture<'a, Result<f64, ServiceError>> {
        Box::pin(async move {
            *self.calls.lock().expect("calls lock") += 1;
            let mut failures_left = self.failures_left.lock().expect("failures lock");
            if *failures_left > 0 {
                *failures_left -= 1;
                return Err(ServiceError::rate_limited("slow down"));
            }

            Ok(0.65)
        })
    }
}

#[derive(Default)]
struct CountingHooks {
    failures: Mutex<Vec<(ServiceId, String)>>,
    starts: Mutex<u32>,
}

impl ServiceOperationHooks for CountingHooks {
    fn on_call_start(&self, _service: ServiceId, _operation: &str) {
        *self.starts.lock().expect("starts lock") += 1;
    }

    fn on_call_failure(
        &self,
        service: ServiceId,
        operation: &str,
        _error: &ServiceError,
        _elapsed: Duration,
    ) {
        self.failures
            .lock()
            .expect("failures lock")
            .push((service, operation.to_string()));
    }
}

#[tokio::test]
async fn collaborators_are_usable_as_shared_trait_objects() {
    let classifier: Arc<dyn IntentClassifier> = Arc::new(StaticIntentClassifier::new().with_rule(
        "insurance",
        IntentResult::new("", "INeedInsurance", 0.9).with_entity("InsuranceType", "Car"),
    ));
    let knowledge: Arc<dyn KnowledgeBase> =
        Arc::new(StaticKnowledgeBase::new().with_answer("claim", "Call 555-0100.", 0.93));
    let tagger: Arc<dyn ImageTagger> = Arc::new(StaticImageTagger::not_car("a cat on a sofa"));

    let intent = classifier
        .classify("I need car insurance")
        .await
        .expect("classify should succeed");
    assert_eq!(intent.entity("InsuranceType"), Some("Car"));

    let answers = knowledge
        .query("how do I file a claim")
        .await
        .expect("query should succeed");
    assert_eq!(answers[0].answer, "Call 555-0100.");

    let analysis = tagger.analyze(b"png").await.expect("analyze should succeed");
    assert!(!analysis.is_car);
    assert_eq!(analysis.caption, "a cat on a sofa");
}

#[tokio::test]
async fn rate_limited_collaborator_is_called_once_per_observation() {
    let scorer = FlakyScorer {
        failures_left: Mutex::new(1),
        calls: Mutex::new(0),
    };
    let hooks = CountingHooks::default();

    let error = observe_once(
        ServiceId::SentimentScorer,
        "score",
        &hooks,
        scorer.score("this is fine"),
    )
    .await
    .expect_err("first call is rate limited");
    assert_eq!(error.kind, ServiceErrorKind::RateLimited);
    assert_eq!(*scorer.calls.lock().expect("calls lock"), 1);

    let score = observe_once(
        ServiceId::SentimentScorer,
        "score",
        &hooks,
        scorer.score("this is fine"),
    )
    .await
    .expect("next turn succeeds");
    assert_eq!(score, 0.65);
    assert_eq!(*hooks.starts.lock().expect("starts lock"), 2);
}

#[tokio::test]
async fn car_type_classifier_is_shareable_and_ranked_by_probability() {
    let classifier: Arc<dyn CarTypeClassifier> = Arc::new(
        StaticCarTypeClassifier::new()
            .with_prediction("Sedan", 0.64)
            .with_prediction("SUV", 0.31),
    );

    let predictions = classifier.predict(b"jpeg").await.expect("predict");
    assert_eq!(
        top_car_type(&predictions).map(|prediction| prediction.tag.as_str()),
        Some("Sedan")
    );
}

#[tokio::test]
async fn observed_failure_is_reported_once_and_returned() {
    let scorer = StaticSentimentScorer::failing(ServiceError::unavailable("down"));
    let hooks = CountingHooks::default();

    let error = observe_once(
        ServiceId::SentimentScorer,
        "score",
        &hooks,
        scorer.score("great"),
    )
    .await
    .expect_err("failing scorer must fail");

    assert_eq!(error.kind, ServiceErrorKind::Unavailable);
    assert_eq!(
        hooks.failures.lock().expect("failures lock").as_slice(),
        &[(ServiceId::SentimentScorer, "score".to_string())]
    );
}
