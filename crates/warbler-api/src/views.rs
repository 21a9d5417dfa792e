use std::collections::HashSet;

use warbler_db::models::{MessageRow, UserRow, UserStats};
use warbler_types::models::{MessageView, UserCounts, UserView};

pub(crate) fn user_view(row: &UserRow) -> UserView {
    UserView {
        id: row.id,
        username: row.username.clone(),
        image_url: row.image_url.clone(),
        header_image_url: row.header_image_url.clone(),
        bio: row.bio.clone(),
        location: row.location.clone(),
    }
}

pub(crate) fn user_views(rows: &[UserRow]) -> Vec<UserView> {
    rows.iter().map(user_view).collect()
}

pub(crate) fn message_view(row: MessageRow, liked: bool) -> MessageView {
    MessageView {
        id: row.id,
        text: row.text,
        timestamp: row.timestamp,
        user_id: row.user_id,
        author_username: row.author_username,
        author_image_url: row.author_image_url,
        liked,
    }
}

/// Annotates each message with whether it is in the viewer's liked set.
pub(crate) fn message_views(rows: Vec<MessageRow>, liked: &HashSet<i64>) -> Vec<MessageView> {
    rows.into_iter()
        .map(|row| {
            let is_liked = liked.contains(&row.id);
            message_view(row, is_liked)
        })
        .collect()
}

pub(crate) fn counts(stats: UserStats) -> UserCounts {
    UserCounts {
        messages: stats.messages,
        following: stats.following,
        followers: stats.followers,
        likes: stats.likes,
    }
}
