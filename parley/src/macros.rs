/// Builds a `Vec<CardChoice>` whose titles equal their values.
///
/// ```rust
/// use parley::pl_choices;
///
/// let choices = pl_choices!["Sedan", "SUV", "Sports car"];
/// assert_eq!(choices.len(), 3);
/// assert_eq!(choices[2].title, "Sports car");
/// ```
#[macro_export]
macro_rules! pl_choices {
    () => {
        Vec::<$crate::CardChoice>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::CardChoice::new($value)),+]
    };
}

/// Creates a message [`Activity`](crate::Activity) from an input-kind shorthand.
///
/// ```rust
/// use parley::{Activity, pl_message};
///
/// let activity = pl_message!("conv-1", "user-1", choice => "SUV");
/// let Activity::Message(message) = activity else {
///     panic!("expected a message activity");
/// };
/// assert_eq!(message.input.as_text(), Some("SUV"));
/// ```
#[macro_export]
macro_rules! pl_message {
    ($conversation:expr, $from:expr, text => $value:expr $(,)?) => {
        $crate::Activity::message($conversation, $from, $crate::TurnInput::text($value))
    };
    ($conversation:expr, $from:expr, choice => $value:expr $(,)?) => {
        $crate::Activity::message($conversation, $from, $crate::TurnInput::choice($value))
    };
    ($conversation:expr, $from:expr, attachments => $value:expr $(,)?) => {
        $crate::Activity::message($conversation, $from, $crate::TurnInput::attachments($value))
    };
    ($conversation:expr, $from:expr, $kind:ident => $value:expr $(,)?) => {
        compile_error!("unsupported input kind: use text, choice, or attachments");
    };
}
