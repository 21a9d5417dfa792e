use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    pub messages: u64,
    pub following: u64,
    pub followers: u64,
    pub likes: u64,
}

/// A message as seen by a particular viewer; `liked` is that viewer's like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub author_username: String,
    pub author_image_url: String,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub user: UserView,
    pub counts: UserCounts,
    pub messages: Vec<MessageView>,
    pub is_self: bool,
    pub is_following: bool,
    pub is_followed_by: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListView {
    pub query: Option<String>,
    pub users: Vec<UserView>,
}

/// Followers or followees of `user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowListView {
    pub user: UserView,
    pub users: Vec<UserView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedMessagesView {
    pub user: UserView,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HomeView {
    Anonymous,
    Feed { messages: Vec<MessageView> },
}
