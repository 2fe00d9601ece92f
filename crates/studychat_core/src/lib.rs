pub mod domain;
pub mod ports;

pub use domain::{
    ChatMessage, Citation, Complexity, Conversation, ConversationPreferences, Delivery, Document,
    LearningStyle, Message, RegisterResponse, Role, TokenResponse, Tone, UserPreferences,
    UserProfile,
};
pub use ports::{BackendApi, PortError, PortResult, TokenStore};
