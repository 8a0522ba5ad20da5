//! Mapping between serenity's model types and the platform-neutral ones.

use serenity::all::{
    ActionRow as WireActionRow, ActionRowComponent, Button as WireButton, ButtonKind,
    ButtonStyle as WireButtonStyle, ChannelType, CreateActionRow, CreateAttachment, CreateButton,
    CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage, Embed as WireEmbed,
    GuildChannel, Member as WireMember, Message, PermissionOverwrite as WireOverwrite,
    PermissionOverwriteType, Permissions as WirePermissions, RoleId, StickerId, UserId,
};

use crate::engine::permissions::{OverwriteTarget, PermissionOverwrite, Permissions};
use crate::error::PlatformError;
use crate::platform::{
    ActionRow, Attachment, Button, ButtonAction, ButtonStyle, Channel, ChannelKind, Embed,
    EmbedAuthor, EmbedField, Member, MessagePayload, PostedMessage,
};

/// Parse a snowflake. Zero is rejected because serenity ids are non-zero.
pub fn parse_id(id: &str) -> Result<u64, PlatformError> {
    id.parse::<u64>()
        .ok()
        .filter(|n| *n != 0)
        .ok_or_else(|| PlatformError::InvalidId(id.to_string()))
}

pub fn permissions_to_wire(perms: Permissions) -> WirePermissions {
    WirePermissions::from_bits_truncate(perms.bits())
}

pub fn permissions_from_wire(perms: WirePermissions) -> Permissions {
    Permissions::from_bits_truncate(perms.bits())
}

pub fn overwrite_to_wire(ow: &PermissionOverwrite) -> Result<WireOverwrite, PlatformError> {
    let id = parse_id(&ow.target_id)?;
    let kind = match ow.target_type {
        OverwriteTarget::Role => PermissionOverwriteType::Role(RoleId::new(id)),
        OverwriteTarget::Member => PermissionOverwriteType::Member(UserId::new(id)),
    };
    Ok(WireOverwrite {
        allow: permissions_to_wire(ow.allow),
        deny: permissions_to_wire(ow.deny),
        kind,
    })
}

pub fn overwrite_from_wire(ow: &WireOverwrite) -> Option<PermissionOverwrite> {
    let allow = permissions_from_wire(ow.allow);
    let deny = permissions_from_wire(ow.deny);
    match ow.kind {
        PermissionOverwriteType::Role(id) => {
            Some(PermissionOverwrite::role(id.get().to_string(), allow, deny))
        }
        PermissionOverwriteType::Member(id) => {
            Some(PermissionOverwrite::member(id.get().to_string(), allow, deny))
        }
        _ => None,
    }
}

pub fn kind_to_wire(kind: ChannelKind) -> ChannelType {
    match kind {
        ChannelKind::Category => ChannelType::Category,
        ChannelKind::Voice => ChannelType::Voice,
        ChannelKind::News => ChannelType::News,
        // Nothing creates `Other`; fall back to a plain text channel.
        ChannelKind::Text | ChannelKind::Other => ChannelType::Text,
    }
}

pub fn kind_from_wire(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Category => ChannelKind::Category,
        ChannelType::Text => ChannelKind::Text,
        ChannelType::Voice => ChannelKind::Voice,
        ChannelType::News => ChannelKind::News,
        _ => ChannelKind::Other,
    }
}

pub fn channel_from_wire(ch: &GuildChannel) -> Channel {
    Channel {
        id: ch.id.get().to_string(),
        name: ch.name.clone(),
        kind: kind_from_wire(ch.kind),
        parent_id: ch.parent_id.map(|p| p.get().to_string()),
        overwrites: ch
            .permission_overwrites
            .iter()
            .filter_map(overwrite_from_wire)
            .collect(),
    }
}

pub fn member_from_wire(member: &WireMember) -> Member {
    Member {
        id: member.user.id.get().to_string(),
        display_name: member.display_name().to_string(),
        tag: member.user.tag(),
        is_bot: member.user.bot,
    }
}

/// `None` for direct messages, which never take part in the relay.
pub fn message_from_wire(msg: &Message) -> Option<PostedMessage> {
    let guild_id = msg.guild_id?;
    Some(PostedMessage {
        id: msg.id.get().to_string(),
        guild_id: guild_id.get().to_string(),
        channel_id: msg.channel_id.get().to_string(),
        author_id: msg.author.id.get().to_string(),
        author_is_bot: msg.author.bot,
        payload: MessagePayload {
            content: msg.content.clone(),
            embeds: msg.embeds.iter().map(embed_from_wire).collect(),
            attachments: msg
                .attachments
                .iter()
                .map(|a| Attachment {
                    filename: a.filename.clone(),
                    url: a.url.clone(),
                })
                .collect(),
            sticker_ids: msg
                .sticker_items
                .iter()
                .map(|s| s.id.get().to_string())
                .collect(),
            components: msg.components.iter().filter_map(action_row_from_wire).collect(),
        },
    })
}

/// Build the outgoing message. Each field is set only when the payload has
/// content for it; `files` are the already-downloaded attachments.
pub fn message_to_wire(
    payload: &MessagePayload,
    files: Vec<CreateAttachment>,
) -> Result<CreateMessage, PlatformError> {
    let mut builder = CreateMessage::new();
    if !payload.content.is_empty() {
        builder = builder.content(&payload.content);
    }
    if !payload.embeds.is_empty() {
        builder = builder.embeds(payload.embeds.iter().map(embed_to_wire).collect());
    }
    if !files.is_empty() {
        builder = builder.add_files(files);
    }
    if !payload.sticker_ids.is_empty() {
        let ids = payload
            .sticker_ids
            .iter()
            .map(|id| parse_id(id).map(StickerId::new))
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.sticker_ids(ids);
    }
    if !payload.components.is_empty() {
        builder = builder.components(payload.components.iter().map(action_row_to_wire).collect());
    }
    Ok(builder)
}

pub fn embed_from_wire(embed: &WireEmbed) -> Embed {
    Embed {
        title: embed.title.clone(),
        description: embed.description.clone(),
        url: embed.url.clone(),
        colour: embed.colour.map(|c| c.0),
        author: embed.author.as_ref().map(|a| EmbedAuthor {
            name: a.name.clone(),
            url: a.url.clone(),
            icon_url: a.icon_url.clone(),
        }),
        fields: embed
            .fields
            .iter()
            .map(|f| EmbedField {
                name: f.name.clone(),
                value: f.value.clone(),
                inline: f.inline,
            })
            .collect(),
        footer: embed.footer.as_ref().map(|f| f.text.clone()),
        image_url: embed.image.as_ref().map(|i| i.url.clone()),
        thumbnail_url: embed.thumbnail.as_ref().map(|t| t.url.clone()),
    }
}

pub fn embed_to_wire(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    if let Some(url) = &embed.url {
        builder = builder.url(url);
    }
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    if let Some(author) = &embed.author {
        let mut a = CreateEmbedAuthor::new(&author.name);
        if let Some(url) = &author.url {
            a = a.url(url);
        }
        if let Some(icon) = &author.icon_url {
            a = a.icon_url(icon);
        }
        builder = builder.author(a);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(image) = &embed.image_url {
        builder = builder.image(image);
    }
    if let Some(thumbnail) = &embed.thumbnail_url {
        builder = builder.thumbnail(thumbnail);
    }
    builder
}

/// Only button rows are carried over; select menus and text inputs are
/// bound to the original message's interaction handlers and are dropped.
pub fn action_row_from_wire(row: &WireActionRow) -> Option<ActionRow> {
    let buttons: Vec<Button> = row
        .components
        .iter()
        .filter_map(|c| match c {
            ActionRowComponent::Button(b) => button_from_wire(b),
            _ => None,
        })
        .collect();
    (!buttons.is_empty()).then_some(ActionRow { buttons })
}

fn button_from_wire(button: &WireButton) -> Option<Button> {
    let action = match &button.data {
        ButtonKind::Link { url } => ButtonAction::Link { url: url.clone() },
        ButtonKind::NonLink { custom_id, style } => ButtonAction::Custom {
            custom_id: custom_id.clone(),
            style: style_from_wire(*style)?,
        },
        _ => return None,
    };
    Some(Button {
        label: button.label.clone(),
        action,
        disabled: button.disabled,
    })
}

fn style_from_wire(style: WireButtonStyle) -> Option<ButtonStyle> {
    match style {
        WireButtonStyle::Primary => Some(ButtonStyle::Primary),
        WireButtonStyle::Secondary => Some(ButtonStyle::Secondary),
        WireButtonStyle::Success => Some(ButtonStyle::Success),
        WireButtonStyle::Danger => Some(ButtonStyle::Danger),
        _ => None,
    }
}

fn style_to_wire(style: ButtonStyle) -> WireButtonStyle {
    match style {
        ButtonStyle::Primary => WireButtonStyle::Primary,
        ButtonStyle::Secondary => WireButtonStyle::Secondary,
        ButtonStyle::Success => WireButtonStyle::Success,
        ButtonStyle::Danger => WireButtonStyle::Danger,
    }
}

pub fn action_row_to_wire(row: &ActionRow) -> CreateActionRow {
    CreateActionRow::Buttons(row.buttons.iter().map(button_to_wire).collect())
}

fn button_to_wire(button: &Button) -> CreateButton {
    let mut builder = match &button.action {
        ButtonAction::Link { url } => CreateButton::new_link(url),
        ButtonAction::Custom { custom_id, style } => {
            CreateButton::new(custom_id).style(style_to_wire(*style))
        }
    };
    if let Some(label) = &button.label {
        builder = builder.label(label);
    }
    builder.disabled(button.disabled)
}
