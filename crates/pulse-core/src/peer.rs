//! Synthetic peers.
//!
//! Peers carry display metadata only. They are drawn from a fixed avatar
//! palette at match time and dropped with the session, so nothing links a
//! peer in one session to a peer in another.

use serde::Serialize;

use crate::env::Environment;

/// Label shown for generated 1:1 partners.
pub const ANONYMOUS_PEER: &str = "Anonymous Peer";

/// Label shown to a venter for their listener.
pub const ANONYMOUS_LISTENER: &str = "Anonymous Listener";

/// Label shown on group chatter.
pub const ANONYMOUS: &str = "Anonymous";

/// Color token used by hosts to theme a peer's bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorTheme {
    /// Warm orange
    Orange,
    /// Neutral slate
    Slate,
    /// Neutral zinc
    Zinc,
    /// Yellow
    Yellow,
    /// Green
    Green,
    /// Amber
    Amber,
    /// Soft red
    Red,
    /// Soft pink
    Pink,
}

/// An anonymous avatar from the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avatar {
    /// Display glyph
    pub icon: &'static str,
    /// Color token
    pub theme: ColorTheme,
}

/// Fixed avatar palette.
pub const AVATARS: [Avatar; 8] = [
    Avatar { icon: "🦊", theme: ColorTheme::Orange },
    Avatar { icon: "🐼", theme: ColorTheme::Slate },
    Avatar { icon: "🐨", theme: ColorTheme::Zinc },
    Avatar { icon: "🦁", theme: ColorTheme::Yellow },
    Avatar { icon: "🐸", theme: ColorTheme::Green },
    Avatar { icon: "🦉", theme: ColorTheme::Amber },
    Avatar { icon: "🐯", theme: ColorTheme::Red },
    Avatar { icon: "🐰", theme: ColorTheme::Pink },
];

/// A synthetic chat partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peer {
    /// Display glyph
    pub display_icon: &'static str,
    /// Display label
    pub display_label: String,
    /// Color token
    pub color_theme: ColorTheme,
}

impl Peer {
    /// Build a peer from an avatar.
    pub fn from_avatar(avatar: Avatar, label: impl Into<String>) -> Self {
        Self { display_icon: avatar.icon, display_label: label.into(), color_theme: avatar.theme }
    }

    /// Draw a random avatar from the palette.
    pub fn synthesize<E: Environment>(env: &E, label: impl Into<String>) -> Self {
        Self::from_avatar(AVATARS[env.random_below(AVATARS.len())], label)
    }
}
