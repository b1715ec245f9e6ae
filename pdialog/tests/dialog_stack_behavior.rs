use std::sync::Arc;

use pcommon::TurnInput;
use pdialog::{
    DIALOG_STACK_KEY, DialogEngine, DialogErrorKind, DialogPolicy, DialogStack, Flow,
    FlowRegistry, PromptRequest, TurnStatus,
};
use pprompt::{DefaultValidationRuntime, PromptValue, ValidationOutcome, ValidatorRegistry};
use pstate::{ConversationStateStore, InMemoryStateBackend, StateBackend};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Order {
    kind: Option<String>,
    size: Option<String>,
    quantity: Option<i64>,
}

fn validators() -> Arc<ValidatorRegistry> {
    let mut registry = ValidatorRegistry::new();
    registry.register_sync_fn("quantity", |input, _context| {
        Ok(
            match input.as_text().and_then(|text| text.trim().parse::<i64>().ok()) {
                Some(quantity) if (1..=10).contains(&quantity) => {
                    ValidationOutcome::accept(PromptValue::Number(quantity))
                }
                _ => ValidationOutcome::reject("Please order between 1 and 10."),
            },
        )
    });
    Arc::new(registry)
}

fn flows() -> Arc<FlowRegistry<Order>> {
    let mut flows = FlowRegistry::new();

    flows.register(
        Flow::<Order>::new("choose_kind")
            .step("init", |mut ctx| async move {
                if !ctx.has_state() {
                    let seeded = ctx.options_as::<Order>().unwrap_or_default();
                    ctx.set_state(seeded);
                }
                Ok(ctx.skip())
            })
            .step("ask_kind", |ctx| async move {
                if ctx.state().and_then(|order| order.kind.as_ref()).is_some() {
                    return Ok(ctx.skip());
                }
                Ok(ctx.prompt(PromptRequest::text("Coffee or tea?")))
            })
            .step("route", |mut ctx| async move {
                if let Some(kind) = ctx.result_text().map(str::to_string) {
                    ctx.state_or_default().kind.get_or_insert(kind);
                }
                let kind = ctx
                    .state()
                    .and_then(|order| order.kind.clone())
                    .unwrap_or_default();
                if kind.eq_ignore_ascii_case("coffee") {
                    return Ok(ctx.replace("coffee_details", serde_json::Value::Null));
                }
                ctx.send_text(format!("Sorry, we only serve coffee: {kind}"));
                Ok(ctx.end(None))
            }),
    );

    flows.register(
        Flow::<Order>::new("coffee_details")
            .step("ask_size", |ctx| async move {
                Ok(ctx.prompt(PromptRequest::text("Which size?")))
            })
            .step("ask_quantity", |mut ctx| async move {
                let size = ctx.result_text().map(str::to_string);
                ctx.state_or_default().size = size;
                Ok(ctx.prompt(
                    PromptRequest::text("How many cups?").with_validator("quantity"),
                ))
            })
            .step("confirm", |mut ctx| async move {
                let quantity = ctx.result().and_then(PromptValue::as_number);
                ctx.state_or_default().quantity = quantity;
                ctx.send_text("Order placed.");
                Ok(ctx.end(Some(PromptValue::text("placed"))))
            }),
    );

    flows.register(Flow::<Order>::new("loop").step("again", |ctx| async move {
        Ok(ctx.replace("loop", serde_json::Value::Null))
    }));

    flows.register(
        Flow::<Order>::new("parent")
            .step("start_child", |ctx| async move {
                Ok(ctx.begin("child", serde_json::json!({"greeting": "hi"})))
            })
            .step("after_child", |mut ctx| async move {
                let child = ctx.result_text().unwrap_or("nothing").to_string();
                ctx.send_text(format!("child said {child}"));
                Ok(ctx.end(None))
            }),
    );

    flows.register(Flow::<Order>::new("child").step("answer", |ctx| async move {
        let greeting = ctx.options()["greeting"].as_str().unwrap_or("?").to_string();
        Ok(ctx.end(Some(PromptValue::text(greeting))))
    }));

    Arc::new(flows)
}

fn engine(backend: Arc<InMemoryStateBackend>) -> DialogEngine<Order> {
    DialogEngine::new(ConversationStateStore::new(backend), flows())
        .with_validation_runtime(Arc::new(DefaultValidationRuntime::new(validators())))
}

/// Runs one turn with a freshly built engine and context, as a stateless host would.
async fn turn(backend: &Arc<InMemoryStateBackend>, text: &str) -> (TurnStatus, Vec<String>) {
    let engine = engine(Arc::clone(backend));
    let mut ctx = engine.create_context("conv").await.expect("context");
    let result = engine
        .continue_dialog(&mut ctx, &TurnInput::text(text))
        .await
        .expect("continue");
    engine.save(&mut ctx).await.expect("save");
    let sent = ctx.take_outbox().into_iter().map(|m| m.text).collect();
    (result.status, sent)
}

async fn start(backend: &Arc<InMemoryStateBackend>, options: serde_json::Value) -> Vec<String> {
    let engine = engine(Arc::clone(backend));
    let mut ctx = engine.create_context("conv").await.expect("context");
    engine
        .begin(&mut ctx, "choose_kind", options)
        .await
        .expect("begin");
    engine.save(&mut ctx).await.expect("save");
    ctx.take_outbox().into_iter().map(|m| m.text).collect()
}

#[tokio::test]
async fn flow_resumes_across_fresh_engine_instances() {
    let backend = Arc::new(InMemoryStateBackend::new());

    assert_eq!(start(&backend, serde_json::Value::Null).await, vec!["Coffee or tea?"]);
    assert_eq!(
        turn(&backend, "coffee").await,
        (TurnStatus::Waiting, vec!["Which size?".to_string()])
    );
    assert_eq!(
        turn(&backend, "large").await,
        (TurnStatus::Waiting, vec!["How many cups?".to_string()])
    );
    assert_eq!(
        turn(&backend, "2").await,
        (TurnStatus::Complete, vec!["Order placed.".to_string()])
    );

    let engine = engine(Arc::clone(&backend));
    let ctx = engine.create_context("conv").await.expect("context");
    assert!(!ctx.is_active());
    assert_eq!(
        ctx.state(),
        Some(&Order {
            kind: Some("coffee".to_string()),
            size: Some("large".to_string()),
            quantity: Some(2),
        })
    );

    assert_eq!(turn(&backend, "hello?").await, (TurnStatus::Empty, Vec::new()));
}

#[tokio::test]
async fn preset_state_skips_prompts_and_replaces_within_one_turn() {
    let backend = Arc::new(InMemoryStateBackend::new());

    let sent = start(&backend, serde_json::json!({"kind": "Coffee"})).await;
    assert_eq!(sent, vec!["Which size?"]);

    let engine = engine(Arc::clone(&backend));
    let ctx = engine.create_context("conv").await.expect("context");
    let frames = ctx.stack().frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].flow_id, "coffee_details");
    assert_eq!(frames[0].step_index, 1);
}

#[tokio::test]
async fn rejected_answers_repeat_the_same_text_without_advancing() {
    let backend = Arc::new(InMemoryStateBackend::new());
    start(&backend, serde_json::json!({"kind": "coffee"})).await;
    turn(&backend, "small").await;

    for _ in 0..3 {
        let (status, sent) = turn(&backend, "1776").await;
        assert_eq!(status, TurnStatus::Waiting);
        assert_eq!(sent, vec!["Please order between 1 and 10."]);

        let engine = engine(Arc::clone(&backend));
        let ctx = engine.create_context("conv").await.expect("context");
        assert_eq!(ctx.stack().top().map(|frame| frame.step_index), Some(2));
    }

    let engine = engine(Arc::clone(&backend));
    let ctx = engine.create_context("conv").await.expect("context");
    let pending = ctx
        .stack()
        .top()
        .and_then(|frame| frame.pending_prompt.as_ref())
        .expect("pending prompt");
    assert_eq!(pending.rejections, 3);
}

#[tokio::test]
async fn each_turn_issues_at_most_one_prompt() {
    let backend = Arc::new(InMemoryStateBackend::new());
    let mut prompts_seen = vec![start(&backend, serde_json::Value::Null).await];

    for reply in ["coffee", "medium", "0", "3"] {
        prompts_seen.push(turn(&backend, reply).await.1);
    }

    let prompts = ["Coffee or tea?", "Which size?", "How many cups?"];
    for sent in prompts_seen {
        let issued = sent
            .iter()
            .filter(|text| prompts.contains(&text.as_str()))
            .count();
        assert!(issued <= 1, "turn sent {sent:?}");
    }
}

#[tokio::test]
async fn non_car_style_branch_ends_the_flow_with_a_message() {
    let backend = Arc::new(InMemoryStateBackend::new());
    start(&backend, serde_json::Value::Null).await;

    let (status, sent) = turn(&backend, "tea").await;
    assert_eq!(status, TurnStatus::Complete);
    assert_eq!(sent, vec!["Sorry, we only serve coffee: tea"]);
}

#[tokio::test]
async fn self_replacing_flow_trips_the_chain_depth_guard() {
    let backend = Arc::new(InMemoryStateBackend::new());
    let engine = engine(Arc::clone(&backend))
        .with_policy(DialogPolicy::default().with_max_chain_depth(5))
        .expect("policy");
    let mut ctx = engine.create_context("conv").await.expect("context");

    let error = engine
        .begin(&mut ctx, "loop", serde_json::Value::Null)
        .await
        .expect_err("loop must trip the guard");
    assert_eq!(error.kind, DialogErrorKind::ChainDepthExceeded);
    assert!(error.is_invariant_violation());
    assert!(ctx.stack().is_empty());
    assert!(!ctx.has_sent());
}

#[tokio::test]
async fn child_flow_result_resumes_the_parent_inline() {
    let backend = Arc::new(InMemoryStateBackend::new());
    let engine = engine(Arc::clone(&backend));
    let mut ctx = engine.create_context("conv").await.expect("context");

    let result = engine
        .begin(&mut ctx, "parent", serde_json::Value::Null)
        .await
        .expect("begin");

    assert_eq!(result.status, TurnStatus::Complete);
    assert_eq!(ctx.take_outbox()[0].text, "child said hi");
    assert!(ctx.stack().is_empty());
}

#[tokio::test]
async fn persisted_frame_without_pending_prompt_is_an_invalid_stack() {
    let backend = Arc::new(InMemoryStateBackend::new());
    let stack = serde_json::json!([
        {"flow_id": "coffee_details", "step_index": 1, "options": null, "pending_prompt": null}
    ]);
    backend
        .save_properties(
            &"conv".into(),
            [(DIALOG_STACK_KEY.to_string(), pstate::PropertyChange::Set(stack))]
                .into_iter()
                .collect(),
        )
        .await
        .expect("seed");

    let engine = engine(Arc::clone(&backend));
    let mut ctx = engine.create_context("conv").await.expect("context");
    let error = engine
        .continue_dialog(&mut ctx, &TurnInput::text("large"))
        .await
        .expect_err("corrupt stack");
    assert_eq!(error.kind, DialogErrorKind::InvalidStack);

    engine.cancel_all(&mut ctx);
    engine.save(&mut ctx).await.expect("save after cancel");
    let reloaded = backend
        .load_properties(&"conv".into())
        .await
        .expect("load");
    let stack: DialogStack =
        serde_json::from_value(reloaded[DIALOG_STACK_KEY].clone()).expect("decode stack");
    assert!(stack.is_empty());
}
