//! Shared domain types: identifiers, presence records, friend records.

pub mod friend;
pub mod id;
pub mod presence;

pub use friend::{FriendRecord, PendingFriends, UserProfile};
pub use id::{ChannelId, ProducerTag, UserId};
pub use presence::{ActivityDetails, PresenceRecord, PresenceStatus};
