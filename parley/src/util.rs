//! Small convenience constructors for common activities.

use pcommon::{Attachment, ConversationId, TurnInput};

use crate::Activity;

pub fn text_activity(
    conversation_id: impl Into<ConversationId>,
    from: impl Into<String>,
    text: impl Into<String>,
) -> Activity {
    Activity::message(conversation_id, from, TurnInput::text(text))
}

pub fn image_activity(
    conversation_id: impl Into<ConversationId>,
    from: impl Into<String>,
    content_url: impl Into<String>,
) -> Activity {
    Activity::message(
        conversation_id,
        from,
        TurnInput::attachments(vec![image_attachment(content_url)]),
    )
}

pub fn image_attachment(content_url: impl Into<String>) -> Attachment {
    let content_url = content_url.into();
    let content_type = match content_url
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    };

    Attachment::new(content_type).with_content_url(content_url)
}

pub fn members_added<I, M>(
    conversation_id: impl Into<ConversationId>,
    bot_id: impl Into<String>,
    members: I,
) -> Activity
where
    I: IntoIterator<Item = M>,
    M: Into<String>,
{
    Activity::conversation_update(
        conversation_id,
        bot_id,
        members.into_iter().map(Into::into).collect(),
    )
}
