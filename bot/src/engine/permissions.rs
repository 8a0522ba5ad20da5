use bitflags::bitflags;

bitflags! {
    /// Channel permission bitfield.
    /// Bit positions match the Discord wire format, so the gateway adapter
    /// converts with `from_bits_truncate(bits())`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        // ── General ──
        const CREATE_INSTANT_INVITE    = 1 << 0;
        const ADMINISTRATOR            = 1 << 3;
        const VIEW_CHANNEL             = 1 << 10;

        // ── Channel text ──
        const ADD_REACTIONS            = 1 << 6;
        const SEND_MESSAGES            = 1 << 11;
        const SEND_TTS_MESSAGES        = 1 << 12;
        const EMBED_LINKS              = 1 << 14;
        const ATTACH_FILES             = 1 << 15;
        const READ_MESSAGE_HISTORY     = 1 << 16;
        const MENTION_EVERYONE         = 1 << 17;
        const USE_EXTERNAL_EMOJIS      = 1 << 18;
        const USE_APPLICATION_COMMANDS = 1 << 31;
        const USE_EXTERNAL_STICKERS    = 1 << 37;

        // ── Voice ──
        const STREAM                   = 1 << 9;
        const CONNECT                  = 1 << 20;
        const SPEAK                    = 1 << 21;
        const USE_VAD                  = 1 << 25;
        const USE_EMBEDDED_ACTIVITIES  = 1 << 39;
    }
}

/// What a member may do in their own text/voice channels.
pub const MEMBER_ALLOW: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::READ_MESSAGE_HISTORY)
    .union(Permissions::SPEAK)
    .union(Permissions::CONNECT)
    .union(Permissions::USE_VAD);

/// Capabilities withheld from a member even inside their own space.
pub const MEMBER_DENY: Permissions = Permissions::CREATE_INSTANT_INVITE
    .union(Permissions::MENTION_EVERYONE)
    .union(Permissions::USE_EXTERNAL_EMOJIS)
    .union(Permissions::USE_EXTERNAL_STICKERS)
    .union(Permissions::USE_EMBEDDED_ACTIVITIES)
    .union(Permissions::USE_APPLICATION_COMMANDS)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::EMBED_LINKS)
    .union(Permissions::SEND_TTS_MESSAGES)
    .union(Permissions::STREAM);

/// The announcement channel is read-only for its member.
pub const ANNOUNCEMENT_ALLOW: Permissions =
    Permissions::VIEW_CHANNEL.union(Permissions::READ_MESSAGE_HISTORY);

pub const ANNOUNCEMENT_DENY: Permissions = Permissions::SEND_MESSAGES
    .union(Permissions::ADD_REACTIONS)
    .union(Permissions::MENTION_EVERYONE)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::EMBED_LINKS);

/// A channel permission overwrite (allow/deny pair for one role or member).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub target_type: OverwriteTarget,
    pub target_id: String,
    pub allow: Permissions,
    pub deny: Permissions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteTarget {
    Role,
    Member,
}

impl PermissionOverwrite {
    pub fn role(id: impl Into<String>, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target_type: OverwriteTarget::Role,
            target_id: id.into(),
            allow,
            deny,
        }
    }

    pub fn member(id: impl Into<String>, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target_type: OverwriteTarget::Member,
            target_id: id.into(),
            allow,
            deny,
        }
    }

    pub fn is_for_member(&self, member_id: &str) -> bool {
        self.target_type == OverwriteTarget::Member && self.target_id == member_id
    }
}

/// Builds the overwrites attached to every channel of one member's space.
#[derive(Debug, Clone)]
pub struct SpaceTemplate {
    pub member_id: String,
    pub everyone_role_id: String,
    pub admin_role_id: String,
}

impl SpaceTemplate {
    pub fn new(
        member_id: impl Into<String>,
        everyone_role_id: impl Into<String>,
        admin_role_id: impl Into<String>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            everyone_role_id: everyone_role_id.into(),
            admin_role_id: admin_role_id.into(),
        }
    }

    /// Used for the category, `text` and `Meeting`.
    pub fn base(&self) -> Vec<PermissionOverwrite> {
        self.with_member(MEMBER_ALLOW, MEMBER_DENY)
    }

    /// Used for `announcement`: the member can read but not post.
    pub fn announcement(&self) -> Vec<PermissionOverwrite> {
        self.with_member(ANNOUNCEMENT_ALLOW, ANNOUNCEMENT_DENY)
    }

    fn with_member(&self, allow: Permissions, deny: Permissions) -> Vec<PermissionOverwrite> {
        vec![
            PermissionOverwrite::role(
                &self.everyone_role_id,
                Permissions::empty(),
                Permissions::VIEW_CHANNEL,
            ),
            PermissionOverwrite::member(&self.member_id, allow, deny),
            PermissionOverwrite::role(
                &self.admin_role_id,
                Permissions::ADMINISTRATOR,
                Permissions::empty(),
            ),
        ]
    }
}
