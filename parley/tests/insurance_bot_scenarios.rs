use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parley::insurance::messages::{
    CAR_MAKE_PROMPT, CAR_MODEL_PROMPT, CAR_PICTURE_PROMPT, CAR_TYPE_PROMPT, CAR_YEAR_PROMPT,
    CONFIRMATION, DIALOG_RESET, ESCALATION, FEEDBACK_PROMPT, GREETING, INSURANCE_TYPE_PROMPT,
    NOT_UNDERSTOOD, QUOTE, SERVICE_FAILURE,
};
use parley::insurance::{GATHER_INFO, GATHER_INSURANCE_TYPE};
use parley::pdialog::{DIALOG_STACK_KEY, DialogFrame, DialogStack};
use parley::pservices::ServiceFuture;
use parley::{
    Activity, Attachment, BotServices, ConversationState, DialogPolicy, FilesystemStateBackend,
    InMemoryAttachmentLoader, InsuranceBot, IntentResult, KbAnswer, KnowledgeBase,
    OutboundMessage, RecordingChannel, ServiceError, SqliteStateBackend, StateBackend,
    StaticCarTypeClassifier, StaticImageTagger, StaticIntentClassifier, StaticKnowledgeBase,
    StaticSentimentScorer, TurnInput, in_memory_backend,
};

const CONVERSATION: &str = "conv-1";
const USER: &str = "user-1";
const CAR_PHOTO_URL: &str = "https://cdn.example.test/photos/corolla.jpg";

fn classifier() -> StaticIntentClassifier {
    StaticIntentClassifier::new()
        .with_rule(
            "car insurance",
            IntentResult::new("", "INeedInsurance", 0.96).with_entity("InsuranceType", "Car"),
        )
        .with_rule("insurance", IntentResult::new("", "INeedInsurance", 0.91))
}

fn knowledge() -> StaticKnowledgeBase {
    StaticKnowledgeBase::new()
        .with_answer("claim", "You can file a claim online at any time.", 0.72)
        .with_answer("claim", "Claims can be filed from the mobile app.", 0.94)
}

fn services_with(tagger: StaticImageTagger, sentiment: StaticSentimentScorer) -> BotServices {
    BotServices::new(
        Arc::new(classifier()),
        Arc::new(knowledge()),
        Arc::new(tagger),
        Arc::new(sentiment),
    )
    .with_attachment_loader(Arc::new(
        InMemoryAttachmentLoader::new().with_blob(CAR_PHOTO_URL, vec![0xFF, 0xD8, 0xFF]),
    ))
}

fn services() -> BotServices {
    services_with(
        StaticImageTagger::car("a silver sedan parked on a street"),
        StaticSentimentScorer::new(0.8),
    )
}

struct Harness {
    bot: InsuranceBot,
    channel: Arc<RecordingChannel>,
}

impl Harness {
    fn new(services: BotServices) -> Self {
        Self::with_backend(services, in_memory_backend())
    }

    fn with_backend(services: BotServices, backend: Arc<dyn StateBackend>) -> Self {
        let channel = Arc::new(RecordingChannel::new());
        let bot = InsuranceBot::builder(services, channel.clone())
            .backend(backend)
            .current_year(2024)
            .build()
            .expect("bot should build");
        Self { bot, channel }
    }

    async fn turn(&self, input: TurnInput) -> Vec<OutboundMessage> {
        self.bot
            .on_turn(Activity::message(CONVERSATION, USER, input))
            .await
            .expect("turn should succeed");
        self.channel
            .take()
            .expect("channel should drain")
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }

    async fn say(&self, text: &str) -> Vec<String> {
        self.turn(TurnInput::text(text))
            .await
            .into_iter()
            .map(|message| message.text)
            .collect()
    }

    async fn upload_car_photo(&self) -> Vec<String> {
        let photo = Attachment::new("image/jpeg").with_content_url(CAR_PHOTO_URL);
        self.turn(TurnInput::attachments(vec![photo]))
            .await
            .into_iter()
            .map(|message| message.text)
            .collect()
    }

    async fn snapshot(&self) -> (Option<ConversationState>, DialogStack) {
        let ctx = self
            .bot
            .engine()
            .create_context(CONVERSATION)
            .await
            .expect("context should load");
        (ctx.state().cloned(), ctx.stack().clone())
    }

    async fn top_frame(&self) -> Option<DialogFrame> {
        self.snapshot().await.1.top().cloned()
    }

    async fn drive_to_feedback(&self) {
        self.say("I need car insurance").await;
        self.say("Sedan").await;
        self.say("Toyota").await;
        self.say("Corolla").await;
        self.say("2020").await;
        let replies = self.upload_car_photo().await;
        assert_eq!(replies, vec![QUOTE, FEEDBACK_PROMPT]);
    }
}

fn unique_temp_dir(label: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("parley-{label}-{nanos}"))
}

#[tokio::test]
async fn car_request_with_entity_skips_straight_to_car_type() {
    let harness = Harness::new(services());

    let replies = harness.turn(TurnInput::text("I need car insurance")).await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, CAR_TYPE_PROMPT);
    assert!(replies[0].is_card());
    assert_eq!(
        replies[0]
            .choices
            .iter()
            .map(|choice| choice.value.as_str())
            .collect::<Vec<_>>(),
        vec!["Sedan", "SUV", "Sports car"]
    );

    let (state, stack) = harness.snapshot().await;
    assert_eq!(
        state.and_then(|state| state.insurance_type).as_deref(),
        Some("Car")
    );
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.frames()[0].flow_id, GATHER_INFO);
}

#[tokio::test]
async fn full_car_quote_walkthrough_confirms_positive_feedback() {
    let harness = Harness::new(services());

    harness.say("I need car insurance").await;
    assert_eq!(harness.say("sedan").await, vec![CAR_MAKE_PROMPT]);
    assert_eq!(harness.say("Toyota").await, vec![CAR_MODEL_PROMPT]);
    assert_eq!(harness.say("Corolla").await, vec![CAR_YEAR_PROMPT]);

    let before = harness.top_frame().await.expect("year prompt frame");
    assert_eq!(
        harness.say("abcd").await,
        vec!["Please enter a valid year between 1900 and 2025."]
    );
    let after = harness.top_frame().await.expect("year prompt frame");
    assert_eq!(after.step_index, before.step_index);
    assert_eq!(
        after.pending_prompt.as_ref().map(|pending| pending.rejections),
        Some(1)
    );

    assert_eq!(harness.say("2020").await, vec![CAR_PICTURE_PROMPT]);
    assert_eq!(
        harness.upload_car_photo().await,
        vec![QUOTE, FEEDBACK_PROMPT]
    );
    assert_eq!(
        harness.say("Sounds great, let's do it").await,
        vec![CONFIRMATION]
    );

    let (state, stack) = harness.snapshot().await;
    assert!(stack.is_empty());
    let state = state.expect("state should persist after the flow ends");
    assert_eq!(state.car_type.as_deref(), Some("Sedan"));
    assert_eq!(state.car_make.as_deref(), Some("Toyota"));
    assert_eq!(state.car_model.as_deref(), Some("Corolla"));
    assert_eq!(state.car_year, Some(2020));
}

#[tokio::test]
async fn negative_feedback_is_escalated() {
    let harness = Harness::new(services_with(
        StaticImageTagger::car("a silver sedan"),
        StaticSentimentScorer::new(0.3),
    ));
    harness.drive_to_feedback().await;

    assert_eq!(harness.say("That is far too expensive").await, vec![ESCALATION]);
    assert!(harness.snapshot().await.1.is_empty());
}

#[tokio::test]
async fn insurance_request_without_type_asks_and_declines_non_car() {
    let harness = Harness::new(services());

    let replies = harness.turn(TurnInput::text("I want insurance")).await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, INSURANCE_TYPE_PROMPT);
    assert_eq!(replies[0].choices.len(), 3);
    assert_eq!(
        harness.top_frame().await.map(|frame| frame.flow_id),
        Some(GATHER_INSURANCE_TYPE.to_string())
    );

    assert_eq!(
        harness.turn(TurnInput::choice("life")).await[0].text,
        "Right now I can only help with car insurance: Life"
    );

    let (state, stack) = harness.snapshot().await;
    assert!(stack.is_empty());
    assert_eq!(
        state.and_then(|state| state.insurance_type).as_deref(),
        Some("Life")
    );
}

#[tokio::test]
async fn unknown_card_choice_reprompts_with_the_options() {
    let harness = Harness::new(services());
    harness.say("I need car insurance").await;

    assert_eq!(
        harness.say("a pickup truck").await,
        vec!["Please choose one of: Sedan, SUV, Sports car."]
    );
    assert_eq!(
        harness.top_frame().await.map(|frame| frame.step_index),
        Some(1)
    );
}

#[tokio::test]
async fn non_car_photo_is_rejected_with_the_caption() {
    let harness = Harness::new(services_with(
        StaticImageTagger::not_car("a cat sleeping on a sofa"),
        StaticSentimentScorer::new(0.8),
    ));
    harness.say("I need car insurance").await;
    harness.say("Sedan").await;
    harness.say("Toyota").await;
    harness.say("Corolla").await;
    harness.say("2020").await;

    assert_eq!(
        harness.upload_car_photo().await,
        vec![
            "That doesn't look like a sedan, it looks like a cat sleeping on a sofa. Please upload a picture of your car."
        ]
    );
}

#[tokio::test]
async fn photo_of_a_different_body_style_is_rejected() {
    let classifier = Arc::new(StaticCarTypeClassifier::recognizing("SUV"));
    let harness = Harness::new(services().with_car_type_classifier(classifier.clone()));
    harness.say("I need car insurance").await;
    harness.say("Sedan").await;
    harness.say("Toyota").await;
    harness.say("Corolla").await;
    harness.say("2020").await;

    assert_eq!(
        harness.upload_car_photo().await,
        vec!["That looks like a suv, not a sedan. Please upload a picture of your sedan."]
    );
    assert_eq!(classifier.calls().expect("calls"), vec!["3".to_string()]);
    assert_eq!(
        harness.top_frame().await.map(|frame| frame.flow_id),
        Some(GATHER_INFO.to_string())
    );
}

#[tokio::test]
async fn text_instead_of_photo_asks_for_one_image() {
    let harness = Harness::new(services());
    harness.say("I need car insurance").await;
    harness.say("SUV").await;
    harness.say("Honda").await;
    harness.say("CR-V").await;
    harness.say("2019").await;

    assert_eq!(
        harness.say("here it is").await,
        vec!["Please upload exactly one image of your car."]
    );
}

#[tokio::test]
async fn knowledge_base_answers_unrelated_questions_with_top_ranked_answer() {
    let harness = Harness::new(services());

    assert_eq!(
        harness.say("How do I file a claim?").await,
        vec!["Claims can be filed from the mobile app."]
    );
    assert_eq!(harness.say("What's the weather?").await, vec![NOT_UNDERSTOOD]);
    assert!(harness.snapshot().await.1.is_empty());
}

/// Returns its answers in a fixed order regardless of score.
struct RankedKnowledgeBase(Vec<KbAnswer>);

impl KnowledgeBase for RankedKnowledgeBase {
    fn query<'a>(
        &'a self,
        _utterance: &'a str,
    ) -> ServiceFuture<'a, Result<Vec<KbAnswer>, ServiceError>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

#[tokio::test]
async fn knowledge_fallback_sends_the_first_ranked_answer() {
    let services = BotServices::new(
        Arc::new(classifier()),
        Arc::new(RankedKnowledgeBase(vec![
            KbAnswer::new("first ranked", 0.5),
            KbAnswer::new("second ranked", 0.9),
        ])),
        Arc::new(StaticImageTagger::car("a car")),
        Arc::new(StaticSentimentScorer::new(0.8)),
    );
    let harness = Harness::new(services);

    assert_eq!(harness.say("Do you cover boats?").await, vec!["first ranked"]);
}

#[tokio::test]
async fn attachment_without_active_dialog_is_not_understood() {
    let classifier = Arc::new(classifier());
    let services = BotServices::new(
        classifier.clone(),
        Arc::new(knowledge()),
        Arc::new(StaticImageTagger::car("a car")),
        Arc::new(StaticSentimentScorer::new(0.8)),
    );
    let harness = Harness::new(services);

    let photo = Attachment::new("image/png").with_content(vec![1, 2, 3]);
    let replies = harness.turn(TurnInput::attachments(vec![photo])).await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, NOT_UNDERSTOOD);
    assert!(classifier.calls().expect("calls").is_empty());
}

#[tokio::test]
async fn failing_sentiment_scorer_keeps_the_feedback_prompt_active() {
    let harness = Harness::new(services_with(
        StaticImageTagger::car("a silver sedan"),
        StaticSentimentScorer::failing(ServiceError::unavailable("sentiment service down")),
    ));
    harness.drive_to_feedback().await;
    let before = harness.snapshot().await.1;

    assert_eq!(harness.say("Looks good").await, vec![SERVICE_FAILURE]);
    assert_eq!(harness.snapshot().await.1, before);
}

#[tokio::test]
async fn failing_image_tagger_keeps_the_picture_prompt_active() {
    let harness = Harness::new(services_with(
        StaticImageTagger::failing(ServiceError::timeout("vision timed out")),
        StaticSentimentScorer::new(0.8),
    ));
    harness.say("I need car insurance").await;
    harness.say("Sports car").await;
    harness.say("Porsche").await;
    harness.say("911").await;
    harness.say("2023").await;
    let before = harness.snapshot().await.1;

    assert_eq!(harness.upload_car_photo().await, vec![SERVICE_FAILURE]);
    assert_eq!(harness.snapshot().await.1, before);
}

#[tokio::test]
async fn failing_classifier_reports_service_failure() {
    let services = BotServices::new(
        Arc::new(
            StaticIntentClassifier::new().failing(ServiceError::rate_limited("too many requests")),
        ),
        Arc::new(knowledge()),
        Arc::new(StaticImageTagger::car("a car")),
        Arc::new(StaticSentimentScorer::new(0.8)),
    );
    let harness = Harness::new(services);

    assert_eq!(harness.say("I need car insurance").await, vec![SERVICE_FAILURE]);
    assert!(harness.snapshot().await.1.is_empty());
}

#[tokio::test]
async fn stack_without_pending_prompt_is_reset() {
    let harness = Harness::new(services());

    let mut stack = DialogStack::new();
    stack.push(DialogFrame::new(GATHER_INFO, serde_json::Value::Null));
    let mut turn = harness
        .bot
        .engine()
        .store()
        .load(CONVERSATION)
        .await
        .expect("load");
    turn.set(DIALOG_STACK_KEY, &stack).expect("set stack");
    turn.save_changes().await.expect("save");

    assert_eq!(harness.say("Toyota").await, vec![DIALOG_RESET]);
    assert!(harness.snapshot().await.1.is_empty());
}

#[tokio::test]
async fn undecodable_stack_is_reset_and_overwritten() {
    let harness = Harness::new(services());

    let mut turn = harness
        .bot
        .engine()
        .store()
        .load(CONVERSATION)
        .await
        .expect("load");
    turn.set(DIALOG_STACK_KEY, &serde_json::json!({"not": "a stack"}))
        .expect("set stack");
    turn.save_changes().await.expect("save");

    assert_eq!(harness.say("hello").await, vec![DIALOG_RESET]);

    let turn = harness
        .bot
        .engine()
        .store()
        .load(CONVERSATION)
        .await
        .expect("reload");
    let stored = turn
        .get::<DialogStack>(DIALOG_STACK_KEY)
        .expect("stack decodes after the reset")
        .expect("stack written");
    assert!(stored.is_empty());

    assert_eq!(
        harness.say("I need car insurance").await,
        vec![CAR_TYPE_PROMPT]
    );
}

#[tokio::test]
async fn chain_depth_guard_resets_the_conversation() {
    let channel = Arc::new(RecordingChannel::new());
    let bot = InsuranceBot::builder(services(), channel.clone())
        .policy(DialogPolicy::default().with_max_chain_depth(2))
        .build()
        .expect("bot should build");

    bot.on_turn(Activity::message(
        CONVERSATION,
        USER,
        TurnInput::text("I need car insurance"),
    ))
    .await
    .expect("turn");

    assert_eq!(
        channel.texts(CONVERSATION).expect("texts"),
        vec![DIALOG_RESET]
    );
    let ctx = bot
        .engine()
        .create_context(CONVERSATION)
        .await
        .expect("context");
    assert!(!ctx.is_active());
}

#[tokio::test]
async fn new_members_are_greeted_but_not_the_bot() {
    let harness = Harness::new(services());

    harness
        .bot
        .on_turn(Activity::conversation_update(
            CONVERSATION,
            "Insurance-Bot",
            vec!["insurance-bot".to_string(), "alice".to_string(), "bob".to_string()],
        ))
        .await
        .expect("turn");

    let greeted = harness.channel.take().expect("take");
    assert_eq!(greeted.len(), 2);
    assert!(greeted.iter().all(|(_, message)| message.text == GREETING));
    assert_eq!(
        greeted
            .iter()
            .map(|(_, message)| message.recipient.as_deref())
            .collect::<Vec<_>>(),
        vec![Some("alice"), Some("bob")]
    );
}

#[tokio::test]
async fn other_activities_are_ignored() {
    let harness = Harness::new(services());

    harness
        .bot
        .on_turn(Activity::other(CONVERSATION, "typing"))
        .await
        .expect("turn");

    assert!(harness.channel.sent().expect("sent").is_empty());
    assert!(harness.snapshot().await.1.is_empty());
}

#[tokio::test]
async fn filesystem_backend_resumes_across_bot_instances() {
    let root = unique_temp_dir("fs");
    let first = Harness::with_backend(
        services(),
        Arc::new(FilesystemStateBackend::new(&root).expect("filesystem backend")),
    );
    first.say("I need car insurance").await;
    first.say("Sedan").await;

    let second = Harness::with_backend(
        services(),
        Arc::new(FilesystemStateBackend::new(&root).expect("filesystem backend")),
    );
    assert_eq!(second.say("Toyota").await, vec![CAR_MODEL_PROMPT]);
    let (state, _) = second.snapshot().await;
    assert_eq!(
        state.and_then(|state| state.car_make).as_deref(),
        Some("Toyota")
    );

    let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn sqlite_backend_resumes_across_bot_instances() {
    let dir = unique_temp_dir("sqlite");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("state.db");

    let first = Harness::with_backend(
        services(),
        Arc::new(SqliteStateBackend::new(&path).expect("sqlite backend")),
    );
    first.say("I need car insurance").await;
    first.say("SUV").await;
    first.say("Subaru").await;

    let second = Harness::with_backend(
        services(),
        Arc::new(SqliteStateBackend::new(&path).expect("sqlite backend")),
    );
    assert_eq!(second.say("Forester").await, vec![CAR_YEAR_PROMPT]);

    let _ = std::fs::remove_dir_all(dir);
}
