use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Modifier keys held during a key press.
///
/// Only the bits in [`Modifiers::SIGNIFICANT`] take part in binding lookup;
/// lock keys are carried so toolkits can pass their state through unfiltered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const CONTROL: Self = Self(1);
    pub const SHIFT: Self = Self(2);
    pub const ALT: Self = Self(4);
    /// Command on macOS, Meta elsewhere.
    pub const META: Self = Self(8);
    pub const SUPER: Self = Self(16);
    pub const HYPER: Self = Self(32);
    pub const CAPS_LOCK: Self = Self(64);
    pub const NUM_LOCK: Self = Self(128);

    /// Modifiers that distinguish one binding from another.
    pub const SIGNIFICANT: Self = Self(0b0011_1111);

    /// Display order, matching the usual `ctrl-alt-shift-cmd` convention.
    const NAMES: [(Self, &'static str); 6] = [
        (Self::CONTROL, "ctrl"),
        (Self::ALT, "alt"),
        (Self::SHIFT, "shift"),
        (Self::META, "cmd"),
        (Self::SUPER, "super"),
        (Self::HYPER, "hyper"),
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Drop bits that do not take part in binding lookup.
    pub fn canonical(self) -> Self {
        Self(self.0 & Self::SIGNIFICANT.0)
    }

    /// Parse one modifier name, case-insensitively.
    ///
    /// Accepts both dashed chord names (`ctrl`, `cmd`) and GTK accelerator
    /// names (`Control`, `Primary`, `Mod1`).
    pub fn from_name(name: &str) -> Option<Self> {
        let modifier = match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "primary" => Self::CONTROL,
            "shift" => Self::SHIFT,
            "alt" | "option" | "mod1" => Self::ALT,
            "cmd" | "command" | "meta" => Self::META,
            "super" | "win" => Self::SUPER,
            "hyper" => Self::HYPER,
            _ => return None,
        };
        Some(modifier)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (modifier, name) in Self::NAMES {
            if self.contains(modifier) {
                if !first {
                    f.write_str("-")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyChordError {
    #[error("empty key chord")]
    Empty,

    #[error("unknown modifier '{name}' in key chord '{chord}'")]
    UnknownModifier { name: String, chord: String },

    #[error("key chord '{chord}' has no key")]
    MissingKey { chord: String },

    #[error("unclosed '<' in key chord '{chord}'")]
    UnclosedModifier { chord: String },
}

/// A key plus the significant modifiers held with it.
///
/// Always stored normalized (lowercase key name, canonical modifiers), so
/// equal chords hash equally no matter how they were written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    key: String,
    modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: &str, modifiers: Modifiers) -> Self {
        Self {
            key: normalize_key(key),
            modifiers: modifiers.canonical(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

fn normalize_key(key: &str) -> String {
    if key == " " {
        return "space".to_string();
    }
    let key = key.trim().to_lowercase();
    let alias = match key.as_str() {
        "return" => "enter",
        "esc" => "escape",
        "del" => "delete",
        "ins" => "insert",
        "pgup" | "page_up" => "pageup",
        "pgdn" | "page_down" => "pagedown",
        "minus" => "-",
        "plus" => "+",
        _ => return key,
    };
    alias.to_string()
}

impl FromStr for KeyChord {
    type Err = KeyChordError;

    /// Parse `ctrl-shift-t` style chords or GTK `<Control><Shift>t` accelerators.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KeyChordError::Empty);
        }
        if text.starts_with('<') {
            parse_accelerator(text)
        } else {
            parse_dashed(text)
        }
    }
}

fn parse_dashed(text: &str) -> Result<KeyChord, KeyChordError> {
    // A trailing "--" means the key itself is '-'.
    let (prefix, key) = if text == "-" {
        ("", "-")
    } else if let Some(prefix) = text.strip_suffix("--") {
        (prefix, "-")
    } else {
        text.rsplit_once('-').unwrap_or(("", text))
    };

    if key.is_empty() {
        return Err(KeyChordError::MissingKey {
            chord: text.to_string(),
        });
    }

    let mut modifiers = Modifiers::NONE;
    if !prefix.is_empty() {
        for name in prefix.split('-') {
            modifiers |= Modifiers::from_name(name).ok_or_else(|| {
                KeyChordError::UnknownModifier {
                    name: name.to_string(),
                    chord: text.to_string(),
                }
            })?;
        }
    }

    Ok(KeyChord::new(key, modifiers))
}

fn parse_accelerator(text: &str) -> Result<KeyChord, KeyChordError> {
    let mut modifiers = Modifiers::NONE;
    let mut rest = text;
    while let Some(after) = rest.strip_prefix('<') {
        let (name, tail) = after
            .split_once('>')
            .ok_or_else(|| KeyChordError::UnclosedModifier {
                chord: text.to_string(),
            })?;
        modifiers |= Modifiers::from_name(name).ok_or_else(|| KeyChordError::UnknownModifier {
            name: name.to_string(),
            chord: text.to_string(),
        })?;
        rest = tail;
    }

    let key = rest.trim();
    if key.is_empty() {
        return Err(KeyChordError::MissingKey {
            chord: text.to_string(),
        });
    }
    Ok(KeyChord::new(key, modifiers))
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            f.write_str(&self.key)
        } else {
            write!(f, "{}-{}", self.modifiers, self.key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    fn chord(text: &str) -> KeyChord {
        text.parse().unwrap()
    }

    #[test_case("ctrl-shift-t", "t", Modifiers::CONTROL | Modifiers::SHIFT ; "dashed")]
    #[test_case("Ctrl-Shift-T", "t", Modifiers::CONTROL | Modifiers::SHIFT ; "mixed case")]
    #[test_case("<Control><Shift>t", "t", Modifiers::CONTROL | Modifiers::SHIFT ; "gtk accelerator")]
    #[test_case("<Primary>F5", "f5", Modifiers::CONTROL ; "gtk primary")]
    #[test_case("alt-return", "enter", Modifiers::ALT ; "alias")]
    #[test_case("cmd-k", "k", Modifiers::META ; "command")]
    #[test_case("super-hyper-x", "x", Modifiers::SUPER | Modifiers::HYPER ; "super and hyper")]
    #[test_case("f12", "f12", Modifiers::NONE ; "bare key")]
    #[test_case("ctrl--", "-", Modifiers::CONTROL ; "minus key")]
    #[test_case("-", "-", Modifiers::NONE ; "lone minus")]
    fn parses(text: &str, key: &str, modifiers: Modifiers) {
        let parsed = chord(text);
        assert_eq!(parsed.key(), key);
        assert_eq!(parsed.modifiers(), modifiers);
    }

    #[test]
    fn spellings_of_the_same_chord_are_equal() {
        assert_eq!(chord("ctrl-shift-t"), chord("shift-ctrl-T"));
        assert_eq!(chord("ctrl-shift-t"), chord("<Shift><Control>t"));
        assert_eq!(chord("option-esc"), chord("alt-escape"));
    }

    #[test]
    fn lock_keys_are_not_significant() {
        let held = Modifiers::CONTROL | Modifiers::CAPS_LOCK | Modifiers::NUM_LOCK;
        assert_eq!(KeyChord::new("t", held), chord("ctrl-t"));
        assert_eq!(held.canonical(), Modifiers::CONTROL);
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(chord("shift-cmd-ctrl-p").to_string(), "ctrl-shift-cmd-p");
        assert_eq!(chord("<Mod1>x").to_string(), "alt-x");
        assert_eq!(chord("Enter").to_string(), "enter");
        assert_eq!(chord("ctrl--").to_string(), "ctrl--");
    }

    #[test]
    fn display_parses_back() {
        let original = chord("<Control><Mod1><Shift>Page_Up");
        assert_eq!(chord(&original.to_string()), original);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!("  ".parse::<KeyChord>(), Err(KeyChordError::Empty));
    }

    #[test]
    fn rejects_unknown_modifier() {
        assert_eq!(
            "ctl-t".parse::<KeyChord>(),
            Err(KeyChordError::UnknownModifier {
                name: "ctl".into(),
                chord: "ctl-t".into(),
            })
        );
    }

    #[test]
    fn rejects_missing_key() {
        assert!(matches!(
            "ctrl-".parse::<KeyChord>(),
            Err(KeyChordError::MissingKey { .. })
        ));
        assert!(matches!(
            "<Control>".parse::<KeyChord>(),
            Err(KeyChordError::MissingKey { .. })
        ));
    }

    #[test]
    fn rejects_unclosed_accelerator() {
        assert!(matches!(
            "<Control t".parse::<KeyChord>(),
            Err(KeyChordError::UnclosedModifier { .. })
        ));
    }

    #[test]
    fn modifiers_display() {
        assert_eq!(Modifiers::NONE.to_string(), "");
        assert_eq!((Modifiers::SHIFT | Modifiers::CONTROL).to_string(), "ctrl-shift");
    }

    proptest! {
        #[test]
        fn display_round_trips(bits in 0u8..64, key in "[a-z0-9]{1,6}") {
            let original = KeyChord::new(&key, Modifiers::from_bits(bits));
            prop_assert_eq!(original.to_string().parse::<KeyChord>(), Ok(original));
        }
    }
}
