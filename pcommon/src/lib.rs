//! Shared identifiers and turn value types for workspace crates.
//!
//! ```rust
//! use pcommon::{ConversationId, OutboundMessage, TraceId, TurnInput};
//!
//! let conversation = ConversationId::from("conv-1");
//! let trace = TraceId::new("trace-1");
//! let input = TurnInput::text("I need car insurance");
//! let reply = OutboundMessage::text("Hi! How can I help you today?");
//!
//! assert_eq!(conversation.as_str(), "conv-1");
//! assert_eq!(trace.to_string(), "trace-1");
//! assert_eq!(input.as_text(), Some("I need car insurance"));
//! assert!(!reply.is_card());
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use pcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Metadata and cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use pcommon::{ConversationId, MetadataMap, TraceId};
    //!
    //! let conversation = ConversationId::new("conv-42");
    //! let trace = TraceId::from("trace-42");
    //! let mut metadata = MetadataMap::new();
    //! metadata.insert("channel".to_string(), "webchat".to_string());
    //!
    //! assert_eq!(conversation.to_string(), "conv-42");
    //! assert_eq!(trace.as_str(), "trace-42");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    use serde::{Deserialize, Serialize};

    pub type MetadataMap = HashMap<String, String>;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ConversationId(String);

    impl ConversationId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for ConversationId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for ConversationId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for ConversationId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TraceId(String);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod input {
    //! Inbound turn values delivered by a channel.
    //!
    //! ```rust
    //! use pcommon::{Attachment, TurnInput};
    //!
    //! let picture = Attachment::new("image/png").with_content_url("https://example.test/car.png");
    //! let input = TurnInput::attachments(vec![picture]);
    //!
    //! assert!(input.as_text().is_none());
    //! assert_eq!(input.as_attachments().len(), 1);
    //! assert!(input.as_attachments()[0].is_image());
    //! ```

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Attachment {
        pub content_type: String,
        pub name: Option<String>,
        pub content_url: Option<String>,
        pub content: Option<Vec<u8>>,
    }

    impl Attachment {
        pub fn new(content_type: impl Into<String>) -> Self {
            Self {
                content_type: content_type.into(),
                name: None,
                content_url: None,
                content: None,
            }
        }

        pub fn with_name(mut self, name: impl Into<String>) -> Self {
            self.name = Some(name.into());
            self
        }

        pub fn with_content_url(mut self, content_url: impl Into<String>) -> Self {
            self.content_url = Some(content_url.into());
            self
        }

        pub fn with_content(mut self, content: Vec<u8>) -> Self {
            self.content = Some(content);
            self
        }

        pub fn is_image(&self) -> bool {
            self.content_type
                .trim()
                .to_ascii_lowercase()
                .starts_with("image/")
        }
    }

    /// One inbound user turn: free text, a structured choice selection, or attachments.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "kind", content = "value", rename_all = "snake_case")]
    pub enum TurnInput {
        Text(String),
        Choice(String),
        Attachments(Vec<Attachment>),
    }

    impl TurnInput {
        pub fn text(value: impl Into<String>) -> Self {
            Self::Text(value.into())
        }

        pub fn choice(value: impl Into<String>) -> Self {
            Self::Choice(value.into())
        }

        pub fn attachments(attachments: Vec<Attachment>) -> Self {
            Self::Attachments(attachments)
        }

        /// Text carried by a free-text reply or a choice selection.
        pub fn as_text(&self) -> Option<&str> {
            match self {
                Self::Text(value) | Self::Choice(value) => Some(value.as_str()),
                Self::Attachments(_) => None,
            }
        }

        pub fn as_attachments(&self) -> &[Attachment] {
            match self {
                Self::Attachments(attachments) => attachments.as_slice(),
                _ => &[],
            }
        }
    }
}

pub mod message {
    //! Outbound messages emitted by the bot.
    //!
    //! ```rust
    //! use pcommon::{CardChoice, OutboundMessage};
    //!
    //! let card = OutboundMessage::card(
    //!     "Please select a car type.",
    //!     vec![CardChoice::new("Sedan"), CardChoice::new("SUV")],
    //! );
    //!
    //! assert!(card.is_card());
    //! assert_eq!(card.choices[1].value, "SUV");
    //! ```

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CardChoice {
        pub title: String,
        pub value: String,
        pub image_url: Option<String>,
    }

    impl CardChoice {
        pub fn new(value: impl Into<String>) -> Self {
            let value = value.into();
            Self {
                title: value.clone(),
                value,
                image_url: None,
            }
        }

        pub fn with_title(mut self, title: impl Into<String>) -> Self {
            self.title = title.into();
            self
        }

        pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
            self.image_url = Some(image_url.into());
            self
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OutboundMessage {
        pub text: String,
        pub choices: Vec<CardChoice>,
        pub recipient: Option<String>,
    }

    impl OutboundMessage {
        pub fn text(text: impl Into<String>) -> Self {
            Self {
                text: text.into(),
                choices: Vec::new(),
                recipient: None,
            }
        }

        pub fn card(text: impl Into<String>, choices: Vec<CardChoice>) -> Self {
            Self {
                text: text.into(),
                choices,
                recipient: None,
            }
        }

        pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
            self.recipient = Some(recipient.into());
            self
        }

        pub fn is_card(&self) -> bool {
            !self.choices.is_empty()
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by flow and validator registries.
    //!
    //! ```rust
    //! use pcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.items.keys()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{ConversationId, MetadataMap, TraceId};
pub use future::BoxFuture;
pub use input::{Attachment, TurnInput};
pub use message::{CardChoice, OutboundMessage};
pub use registry::Registry;
