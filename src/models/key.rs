use std::sync::Arc;

/// Raw key event as produced by the platform-integration layer.
///
/// The capture backend classifies every event into one of these variants
/// before it reaches the resolver, so resolution works on a closed set of
/// shapes instead of probing the platform object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKey {
    /// A key that produced a printable character. Numpad keys carry their
    /// platform virtual-key code alongside the character.
    Character { ch: char, vk: Option<u32> },
    /// A named special key (modifiers, navigation, function and media keys),
    /// identified by the platform's lower-case name.
    Named(Arc<str>),
    /// A bare virtual-key code the platform could not name.
    Code(u32),
    /// Anything else; the textual representation is used as-is.
    Text(Arc<str>),
}

impl RawKey {
    pub fn named(name: &str) -> Self {
        Self::Named(Arc::from(name))
    }

    pub fn text(text: &str) -> Self {
        Self::Text(Arc::from(text))
    }
}
