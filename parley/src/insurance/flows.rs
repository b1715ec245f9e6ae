//! The two insurance flows: insurance-type triage and car detail gathering.

use std::sync::Arc;

use pdialog::{DialogError, Flow, FlowRegistry, PromptRequest};
use pprompt::{CAR_TYPE_METADATA_KEY, PromptValue};
use pservices::{ServiceId, observe_once};

use super::messages::{
    CAR_MAKE_PROMPT, CAR_MODEL_PROMPT, CAR_PICTURE_PROMPT, CAR_TYPE_PROMPT, CAR_YEAR_PROMPT,
    CONFIRMATION, ESCALATION, FEEDBACK_PROMPT, INSURANCE_TYPE_PROMPT, QUOTE,
    SENTIMENT_ESCALATION_THRESHOLD, car_type_choices, insurance_type_choices, only_car_insurance,
};
use super::state::ConversationState;
use super::validators;
use crate::BotServices;

pub const GATHER_INSURANCE_TYPE: &str = "gather_insurance_type";
pub const GATHER_INFO: &str = "gather_info";

pub fn insurance_flows(services: &BotServices) -> FlowRegistry<ConversationState> {
    let mut flows = FlowRegistry::new();
    flows.register(gather_insurance_type());
    flows.register(gather_info(services));
    flows
}

/// Seeds state from the flow options, asks for the insurance type when unknown,
/// and hands car requests over to [`gather_info`].
pub fn gather_insurance_type() -> Flow<ConversationState> {
    Flow::<ConversationState>::new(GATHER_INSURANCE_TYPE)
        .step("initialize_state", |mut ctx| async move {
            if !ctx.has_state() {
                let seeded = ctx.options_as::<ConversationState>().unwrap_or_default();
                ctx.set_state(seeded);
            }
            Ok(ctx.skip())
        })
        .step("ask_insurance_type", |ctx| async move {
            if ctx.state().is_some_and(ConversationState::has_insurance_type) {
                return Ok(ctx.skip());
            }
            Ok(ctx.prompt(
                PromptRequest::card(INSURANCE_TYPE_PROMPT, insurance_type_choices())
                    .with_validator(validators::INSURANCE_TYPE),
            ))
        })
        .step("finish_insurance_type", |mut ctx| async move {
            let reply = ctx.result_text().map(str::to_string);
            let state = ctx.state_or_default();
            if !state.has_insurance_type() {
                state.insurance_type = reply;
            }
            if state.wants_car_insurance() {
                return Ok(ctx.replace(GATHER_INFO, serde_json::Value::Null));
            }

            let requested = state.insurance_type.clone().unwrap_or_default();
            ctx.send_text(only_car_insurance(&requested));
            Ok(ctx.end(None))
        })
}

/// Car type, make, model, year and picture, then the quote and a sentiment-scored
/// feedback reply.
pub fn gather_info(services: &BotServices) -> Flow<ConversationState> {
    let sentiment = Arc::clone(&services.sentiment);
    let hooks = Arc::clone(&services.hooks);

    Flow::<ConversationState>::new(GATHER_INFO)
        .step("prompt_car_type", |ctx| async move {
            Ok(ctx.prompt(
                PromptRequest::card(CAR_TYPE_PROMPT, car_type_choices())
                    .with_validator(validators::CAR_TYPE),
            ))
        })
        .step("prompt_car_make", |mut ctx| async move {
            let car_type = ctx.result_text().map(str::to_string);
            ctx.state_or_default().car_type = car_type;
            Ok(ctx.prompt(PromptRequest::text(CAR_MAKE_PROMPT).with_validator(validators::CAR_MAKE)))
        })
        .step("prompt_car_model", |mut ctx| async move {
            let car_make = ctx.result_text().map(str::to_string);
            ctx.state_or_default().car_make = car_make;
            Ok(ctx.prompt(
                PromptRequest::text(CAR_MODEL_PROMPT).with_validator(validators::CAR_MODEL),
            ))
        })
        .step("prompt_car_year", |mut ctx| async move {
            let car_model = ctx.result_text().map(str::to_string);
            ctx.state_or_default().car_model = car_model;
            Ok(ctx.prompt(PromptRequest::text(CAR_YEAR_PROMPT).with_validator(validators::CAR_YEAR)))
        })
        .step("prompt_car_picture", |mut ctx| async move {
            let car_year = ctx
                .result()
                .and_then(PromptValue::as_number)
                .and_then(|year| i32::try_from(year).ok());
            let state = ctx.state_or_default();
            state.car_year = car_year;

            let mut request =
                PromptRequest::text(CAR_PICTURE_PROMPT).with_validator(validators::CAR_PICTURE);
            if let Some(car_type) = state.car_type.clone() {
                request = request.with_metadata(CAR_TYPE_METADATA_KEY, car_type);
            }
            Ok(ctx.prompt(request))
        })
        .step("prompt_feedback", |mut ctx| async move {
            ctx.send_text(QUOTE);
            Ok(ctx.prompt(PromptRequest::text(FEEDBACK_PROMPT).with_validator(validators::FEEDBACK)))
        })
        .step("score_feedback", move |mut ctx| {
            let sentiment = Arc::clone(&sentiment);
            let hooks = Arc::clone(&hooks);
            async move {
                let feedback = ctx.result_text().unwrap_or_default().to_string();
                let score = observe_once(
                    ServiceId::SentimentScorer,
                    "score",
                    hooks.as_ref(),
                    sentiment.score(&feedback),
                )
                .await?;

                if score < SENTIMENT_ESCALATION_THRESHOLD {
                    ctx.send_text(ESCALATION);
                } else {
                    ctx.send_text(CONFIRMATION);
                }
                Ok::<_, DialogError>(ctx.end(None))
            }
        })
}
