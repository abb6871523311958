use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::RawKey;

/// Windows-style virtual-key codes for the numeric keypad. Checked before
/// the character form so that e.g. keypad `5` resolves to `Num5` instead
/// of `5`.
static NUMPAD_LABELS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    let list: &[(u32, &'static str)] = &[
        (96, "Num0"),
        (97, "Num1"),
        (98, "Num2"),
        (99, "Num3"),
        (100, "Num4"),
        (101, "Num5"),
        (102, "Num6"),
        (103, "Num7"),
        (104, "Num8"),
        (105, "Num9"),
        (106, "Num*"),
        (107, "Num+"),
        (109, "Num-"),
        (110, "Num."),
        (111, "Num/"),
    ];
    list.iter().copied().collect()
});

/// Display labels for named special keys, keyed by the platform's
/// lower-case key name. Left/right variants collapse onto one label.
static NAMED_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let list: &[(&'static str, &'static str)] = &[
        ("space", "Space"),
        ("enter", "Enter"),
        ("backspace", "Backspace"),
        ("tab", "Tab"),
        ("shift", "Shift"),
        ("shift_r", "Shift"),
        ("ctrl", "Ctrl"),
        ("ctrl_l", "Ctrl"),
        ("ctrl_r", "Ctrl"),
        ("alt", "Alt"),
        ("alt_l", "Alt"),
        ("alt_r", "Alt"),
        ("alt_gr", "AltGr"),
        ("caps_lock", "CapsLock"),
        ("esc", "Esc"),
        ("delete", "Delete"),
        ("insert", "Insert"),
        ("home", "Home"),
        ("end", "End"),
        ("page_up", "PageUp"),
        ("page_down", "PageDown"),
        ("up", "Up"),
        ("down", "Down"),
        ("left", "Left"),
        ("right", "Right"),
        ("print_screen", "PrtSc"),
        ("scroll_lock", "ScrLk"),
        ("pause", "Pause"),
        ("num_lock", "NumLock"),
        ("menu", "Menu"),
        ("cmd", "Win"),
        ("cmd_l", "Win"),
        ("cmd_r", "Win"),
        ("fn", "Fn"),
        ("f1", "F1"),
        ("f2", "F2"),
        ("f3", "F3"),
        ("f4", "F4"),
        ("f5", "F5"),
        ("f6", "F6"),
        ("f7", "F7"),
        ("f8", "F8"),
        ("f9", "F9"),
        ("f10", "F10"),
        ("f11", "F11"),
        ("f12", "F12"),
        ("media_play_pause", "Play/Pause"),
        ("media_next", "Next"),
        ("media_previous", "Previous"),
        ("media_volume_up", "VolUp"),
        ("media_volume_down", "VolDown"),
        ("media_volume_mute", "Mute"),
    ];
    list.iter().copied().collect()
});

static CANONICAL_ARCS: Lazy<HashMap<&'static str, Arc<str>>> = Lazy::new(|| {
    let mut out = HashMap::new();
    for s in [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q",
        "r", "s", "t", "u", "v", "w", "x", "y", "z", "0", "1", "2", "3", "4", "5", "6", "7",
        "8", "9",
    ] {
        out.insert(s, Arc::<str>::from(s));
    }
    for &label in NUMPAD_LABELS.values() {
        out.insert(label, Arc::<str>::from(label));
    }
    for &label in NAMED_LABELS.values() {
        out.insert(label, Arc::<str>::from(label));
    }
    out
});

pub fn intern(name: &str) -> Arc<str> {
    CANONICAL_ARCS
        .get(name)
        .cloned()
        .unwrap_or_else(|| Arc::<str>::from(name))
}

/// Resolves a raw key event to its canonical name.
///
/// Resolution is total: every event maps to exactly one non-empty string,
/// so the buffer never sees an empty key. Priority: numpad virtual-key
/// codes, then printable characters (lower-cased), then the named-key
/// table, then synthesized `Key<code>` labels, then the raw text.
pub fn resolve(raw: &RawKey) -> Arc<str> {
    match raw {
        RawKey::Character { ch, vk } => {
            if let Some(vk) = vk {
                if let Some(label) = NUMPAD_LABELS.get(vk) {
                    return intern(label);
                }
            }
            let mut lower = String::with_capacity(4);
            lower.extend(ch.to_lowercase());
            intern(&lower)
        }
        RawKey::Named(name) => match NAMED_LABELS.get(name.as_ref()) {
            Some(label) => intern(label),
            None => {
                let label = title_case(name);
                if label.is_empty() {
                    intern("Unknown")
                } else {
                    intern(&label)
                }
            }
        },
        RawKey::Code(code) => match NUMPAD_LABELS.get(code) {
            Some(label) => intern(label),
            None => intern(&format!("Key{}", code)),
        },
        RawKey::Text(text) => {
            if text.is_empty() {
                intern("Unknown")
            } else {
                intern(text)
            }
        }
    }
}

/// Upper-cases the first letter of each underscore-separated word,
/// keeping separators in place (`browser_back` -> `Browser_Back`).
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    out
}

/// Classifies an `rdev` key into a [`RawKey`]. The OS-supplied text is
/// preferred for character keys so the active keyboard layout wins; the
/// per-variant fallbacks assume a US layout, which is acceptable for a
/// frequency tracker.
pub fn raw_key_from_rdev(key: rdev::Key, name: Option<&str>) -> RawKey {
    use rdev::Key;

    if let Some(name) = name {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if !ch.is_control() && !ch.is_whitespace() {
                return RawKey::Character { ch, vk: None };
            }
        }
    }

    // Keypad keys carry their virtual-key code so the resolver can apply
    // the numpad table ahead of the character form.
    let ch = |ch: char| RawKey::Character { ch, vk: None };
    match key {
        Key::Kp0 => RawKey::Code(96),
        Key::Kp1 => RawKey::Code(97),
        Key::Kp2 => RawKey::Code(98),
        Key::Kp3 => RawKey::Code(99),
        Key::Kp4 => RawKey::Code(100),
        Key::Kp5 => RawKey::Code(101),
        Key::Kp6 => RawKey::Code(102),
        Key::Kp7 => RawKey::Code(103),
        Key::Kp8 => RawKey::Code(104),
        Key::Kp9 => RawKey::Code(105),
        Key::KpMultiply => RawKey::Code(106),
        Key::KpPlus => RawKey::Code(107),
        Key::KpMinus => RawKey::Code(109),
        Key::KpDelete => RawKey::Code(110),
        Key::KpDivide => RawKey::Code(111),

        Key::KeyA => ch('a'),
        Key::KeyB => ch('b'),
        Key::KeyC => ch('c'),
        Key::KeyD => ch('d'),
        Key::KeyE => ch('e'),
        Key::KeyF => ch('f'),
        Key::KeyG => ch('g'),
        Key::KeyH => ch('h'),
        Key::KeyI => ch('i'),
        Key::KeyJ => ch('j'),
        Key::KeyK => ch('k'),
        Key::KeyL => ch('l'),
        Key::KeyM => ch('m'),
        Key::KeyN => ch('n'),
        Key::KeyO => ch('o'),
        Key::KeyP => ch('p'),
        Key::KeyQ => ch('q'),
        Key::KeyR => ch('r'),
        Key::KeyS => ch('s'),
        Key::KeyT => ch('t'),
        Key::KeyU => ch('u'),
        Key::KeyV => ch('v'),
        Key::KeyW => ch('w'),
        Key::KeyX => ch('x'),
        Key::KeyY => ch('y'),
        Key::KeyZ => ch('z'),
        Key::Num0 => ch('0'),
        Key::Num1 => ch('1'),
        Key::Num2 => ch('2'),
        Key::Num3 => ch('3'),
        Key::Num4 => ch('4'),
        Key::Num5 => ch('5'),
        Key::Num6 => ch('6'),
        Key::Num7 => ch('7'),
        Key::Num8 => ch('8'),
        Key::Num9 => ch('9'),
        Key::Comma => ch(','),
        Key::Dot => ch('.'),
        Key::SemiColon => ch(';'),
        Key::Quote => ch('\''),
        Key::BackQuote => ch('`'),
        Key::Slash => ch('/'),
        Key::BackSlash | Key::IntlBackslash => ch('\\'),
        Key::Minus => ch('-'),
        Key::Equal => ch('='),
        Key::LeftBracket => ch('['),
        Key::RightBracket => ch(']'),

        Key::Space => RawKey::named("space"),
        Key::Return | Key::KpReturn => RawKey::named("enter"),
        Key::Backspace => RawKey::named("backspace"),
        Key::Tab => RawKey::named("tab"),
        Key::ShiftLeft => RawKey::named("shift"),
        Key::ShiftRight => RawKey::named("shift_r"),
        Key::ControlLeft => RawKey::named("ctrl_l"),
        Key::ControlRight => RawKey::named("ctrl_r"),
        Key::Alt => RawKey::named("alt_l"),
        Key::AltGr => RawKey::named("alt_gr"),
        Key::MetaLeft => RawKey::named("cmd_l"),
        Key::MetaRight => RawKey::named("cmd_r"),
        Key::CapsLock => RawKey::named("caps_lock"),
        Key::Escape => RawKey::named("esc"),
        Key::Delete => RawKey::named("delete"),
        Key::Insert => RawKey::named("insert"),
        Key::Home => RawKey::named("home"),
        Key::End => RawKey::named("end"),
        Key::PageUp => RawKey::named("page_up"),
        Key::PageDown => RawKey::named("page_down"),
        Key::UpArrow => RawKey::named("up"),
        Key::DownArrow => RawKey::named("down"),
        Key::LeftArrow => RawKey::named("left"),
        Key::RightArrow => RawKey::named("right"),
        Key::PrintScreen => RawKey::named("print_screen"),
        Key::ScrollLock => RawKey::named("scroll_lock"),
        Key::Pause => RawKey::named("pause"),
        Key::NumLock => RawKey::named("num_lock"),
        Key::Function => RawKey::named("fn"),
        Key::F1 => RawKey::named("f1"),
        Key::F2 => RawKey::named("f2"),
        Key::F3 => RawKey::named("f3"),
        Key::F4 => RawKey::named("f4"),
        Key::F5 => RawKey::named("f5"),
        Key::F6 => RawKey::named("f6"),
        Key::F7 => RawKey::named("f7"),
        Key::F8 => RawKey::named("f8"),
        Key::F9 => RawKey::named("f9"),
        Key::F10 => RawKey::named("f10"),
        Key::F11 => RawKey::named("f11"),
        Key::F12 => RawKey::named("f12"),

        Key::Unknown(code) => RawKey::Code(code),
    }
}
