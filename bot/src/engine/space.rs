use crate::platform::{Channel, ChannelKind, Member};

/// Read-only channel the relay posts into.
pub const ANNOUNCEMENT_CHANNEL: &str = "announcement";

/// General text channel; receives the welcome message.
pub const TEXT_CHANNEL: &str = "text";

pub const VOICE_CHANNEL: &str = "Meeting";

/// The fixed children of every member category, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceChannel {
    Announcement,
    Text,
    Voice,
}

impl SpaceChannel {
    pub const ALL: [SpaceChannel; 3] = [Self::Announcement, Self::Text, Self::Voice];

    pub fn name(self) -> &'static str {
        match self {
            Self::Announcement => ANNOUNCEMENT_CHANNEL,
            Self::Text => TEXT_CHANNEL,
            Self::Voice => VOICE_CHANNEL,
        }
    }

    pub fn kind(self) -> ChannelKind {
        match self {
            Self::Announcement | Self::Text => ChannelKind::Text,
            Self::Voice => ChannelKind::Voice,
        }
    }
}

/// Ids of one member's provisioned channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpace {
    pub category_id: String,
    pub announcement_id: String,
    pub text_id: String,
    pub voice_id: String,
}

/// A category named after the member that already grants the member access.
pub fn find_owned_category<'a>(channels: &'a [Channel], member: &Member) -> Option<&'a Channel> {
    channels.iter().find(|ch| {
        ch.kind == ChannelKind::Category
            && ch.name == member.display_name
            && ch.overwrites.iter().any(|ov| ov.is_for_member(&member.id))
    })
}

/// Category lookup used by the relay: prefer one carrying the member's
/// overwrite, else the first category with a matching name.
pub fn find_member_category<'a>(channels: &'a [Channel], member: &Member) -> Option<&'a Channel> {
    find_owned_category(channels, member).or_else(|| {
        channels
            .iter()
            .find(|ch| ch.kind == ChannelKind::Category && ch.name == member.display_name)
    })
}

pub fn find_child<'a>(
    channels: &'a [Channel],
    category_id: &str,
    child: SpaceChannel,
) -> Option<&'a Channel> {
    channels.iter().find(|ch| {
        ch.parent_id.as_deref() == Some(category_id)
            && ch.name == child.name()
            && ch.kind == child.kind()
    })
}

pub fn find_by_id<'a>(channels: &'a [Channel], id: &str) -> Option<&'a Channel> {
    channels.iter().find(|ch| ch.id == id)
}
