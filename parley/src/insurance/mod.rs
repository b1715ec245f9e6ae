//! Insurance-quote domain: conversation record, prompts, validators, and flows.

pub mod flows;
pub mod messages;
pub mod state;
pub mod validators;

pub use flows::{GATHER_INFO, GATHER_INSURANCE_TYPE, gather_info, gather_insurance_type, insurance_flows};
pub use state::ConversationState;
pub use validators::insurance_validators;

/// Intent that starts the insurance flows.
pub const NEED_INSURANCE_INTENT: &str = "INeedInsurance";
/// Entity carrying the requested insurance type.
pub const INSURANCE_TYPE_ENTITY: &str = "InsuranceType";
