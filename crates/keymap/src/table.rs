use anyhow::Result;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use settings::constants::{settings::MAX_STRING_LENGTH, snippets::MAX_TEMPLATE_LENGTH};
use settings::{Config, SnippetEntry};
use snippet::{CompiledSnippet, Environment, SnippetError};
use thiserror::Error;

use crate::chord::{KeyChord, KeyChordError};
use crate::input::ChildInput;

/// What to do when a configured snippet fails to compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Log the error, drop that binding, keep the rest.
    #[default]
    SkipInvalid,
    /// Fail the whole load on the first bad binding.
    Strict,
}

impl LoadPolicy {
    pub fn from_config(config: &Config) -> Self {
        if config.strict_snippets {
            Self::Strict
        } else {
            Self::SkipInvalid
        }
    }
}

/// A configured binding that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("invalid key chord '{keys}': {source}")]
    KeyChord {
        keys: String,
        #[source]
        source: KeyChordError,
    },

    #[error("invalid snippet for '{keys}': {source}")]
    Snippet {
        keys: String,
        #[source]
        source: SnippetError,
    },

    #[error("{field} for '{keys}' is too long ({length} characters, limit {limit})")]
    TooLong {
        keys: String,
        field: &'static str,
        length: usize,
        limit: usize,
    },
}

impl BindingError {
    /// Key chord text of the offending entry, as written in the config.
    pub fn keys(&self) -> &str {
        match self {
            Self::KeyChord { keys, .. } | Self::Snippet { keys, .. } | Self::TooLong { keys, .. } => {
                keys
            }
        }
    }
}

/// A compiled snippet and the chord that fires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetBinding {
    pub chord: KeyChord,
    pub snippet: CompiledSnippet,
    /// Template text as written in the config.
    pub template: String,
    pub description: Option<String>,
}

impl SnippetBinding {
    /// Validate and compile one config entry.
    pub fn compile(entry: &SnippetEntry) -> Result<Self, BindingError> {
        check_length(&entry.keys, "key chord", &entry.keys, MAX_STRING_LENGTH)?;
        check_length(&entry.keys, "snippet", &entry.snippet, MAX_TEMPLATE_LENGTH)?;
        if let Some(description) = &entry.description {
            check_length(&entry.keys, "description", description, MAX_STRING_LENGTH)?;
        }

        let chord = entry
            .keys
            .parse::<KeyChord>()
            .map_err(|source| BindingError::KeyChord {
                keys: entry.keys.clone(),
                source,
            })?;
        let snippet = snippet::compile(&entry.snippet).map_err(|source| BindingError::Snippet {
            keys: entry.keys.clone(),
            source,
        })?;

        Ok(Self {
            chord,
            snippet,
            template: entry.snippet.clone(),
            description: entry.description.clone(),
        })
    }
}

fn check_length(
    keys: &str,
    field: &'static str,
    value: &str,
    limit: usize,
) -> Result<(), BindingError> {
    let length = value.chars().count();
    if length > limit {
        return Err(BindingError::TooLong {
            keys: keys.to_string(),
            field,
            length,
            limit,
        });
    }
    Ok(())
}

/// Chord → snippet lookup table.
///
/// Built once per config load and read-only afterwards, so it can be shared
/// across sessions (e.g. behind an `Arc`) without locking.
#[derive(Debug, Clone, Default)]
pub struct SnippetTable {
    bindings: IndexMap<KeyChord, SnippetBinding, FxBuildHasher>,
    rejected: Vec<BindingError>,
}

impl SnippetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the config, honoring its `strict-snippets` setting.
    pub fn from_config(config: &Config) -> Result<Self, BindingError> {
        Self::from_entries(&config.snippets, LoadPolicy::from_config(config))
    }

    /// Build from entries in order; a later entry for the same chord wins.
    pub fn from_entries(entries: &[SnippetEntry], policy: LoadPolicy) -> Result<Self, BindingError> {
        let mut table = Self::new();
        for entry in entries {
            match SnippetBinding::compile(entry) {
                Ok(binding) => {
                    if let Some(previous) = table.insert(binding) {
                        tracing::warn!(
                            "Snippet for '{}' overrides an earlier binding of {}",
                            entry.keys,
                            previous.chord
                        );
                    }
                }
                Err(e) if policy == LoadPolicy::Strict => return Err(e),
                Err(e) => {
                    tracing::warn!("Skipping snippet: {}", e);
                    table.rejected.push(e);
                }
            }
        }
        tracing::debug!(
            "Loaded {} snippet bindings ({} skipped)",
            table.len(),
            table.rejected.len()
        );
        Ok(table)
    }

    /// Add a binding, returning the one it replaced.
    pub fn insert(&mut self, binding: SnippetBinding) -> Option<SnippetBinding> {
        self.bindings.insert(binding.chord.clone(), binding)
    }

    /// Compile and add one entry.
    pub fn bind(&mut self, entry: &SnippetEntry) -> Result<Option<SnippetBinding>, BindingError> {
        let binding = SnippetBinding::compile(entry)?;
        Ok(self.insert(binding))
    }

    pub fn get(&self, chord: &KeyChord) -> Option<&SnippetBinding> {
        self.bindings.get(chord)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in config order.
    pub fn iter(&self) -> impl Iterator<Item = &SnippetBinding> {
        self.bindings.values()
    }

    /// Entries dropped under [`LoadPolicy::SkipInvalid`].
    pub fn rejected(&self) -> &[BindingError] {
        &self.rejected
    }

    /// Text the chord would type under `environment`, if it is bound.
    pub fn expand<E: Environment + ?Sized>(&self, chord: &KeyChord, environment: &E) -> Option<String> {
        self.get(chord)
            .map(|binding| binding.snippet.evaluate(environment))
    }

    /// Handle a key event: if `chord` is bound, type its snippet into `input`.
    ///
    /// Returns whether the event was consumed. Unbound chords leave `input`
    /// untouched so the key can go to the terminal as usual.
    pub fn dispatch<E, C>(&self, chord: &KeyChord, environment: &E, input: &mut C) -> Result<bool>
    where
        E: Environment + ?Sized,
        C: ChildInput + ?Sized,
    {
        let Some(text) = self.expand(chord, environment) else {
            return Ok(false);
        };
        tracing::debug!("Typing snippet for {} ({} bytes)", chord, text.len());
        input.feed_child(text.as_bytes())?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Modifiers;
    use crate::input::MockChildInput;
    use pretty_assertions::assert_eq;
    use snippet::Variables;
    use tracing_test::traced_test;

    fn entries() -> Vec<SnippetEntry> {
        vec![
            SnippetEntry::new("ctrl-shift-h", "cd $HOME\\n").with_description("home"),
            SnippetEntry::new("alt-c", "\\^C"),
        ]
    }

    fn chord(text: &str) -> KeyChord {
        text.parse().unwrap()
    }

    #[test]
    fn builds_table_in_config_order() {
        let table = SnippetTable::from_entries(&entries(), LoadPolicy::SkipInvalid).unwrap();
        assert_eq!(table.len(), 2);
        let chords: Vec<String> = table.iter().map(|b| b.chord.to_string()).collect();
        assert_eq!(chords, vec!["ctrl-shift-h", "alt-c"]);
        assert!(table.rejected().is_empty());
    }

    #[test]
    fn lookup_ignores_spelling_and_lock_keys() {
        let table = SnippetTable::from_entries(&entries(), LoadPolicy::SkipInvalid).unwrap();
        let pressed = KeyChord::new(
            "H",
            Modifiers::SHIFT | Modifiers::CONTROL | Modifiers::NUM_LOCK,
        );
        let binding = table.get(&pressed).unwrap();
        assert_eq!(binding.description.as_deref(), Some("home"));
        assert_eq!(binding.template, "cd $HOME\\n");
    }

    #[test]
    fn expand_uses_environment() {
        let table = SnippetTable::from_entries(&entries(), LoadPolicy::SkipInvalid).unwrap();
        let env = Variables::new().with("HOME", "/home/u");
        assert_eq!(
            table.expand(&chord("ctrl-shift-h"), &env).as_deref(),
            Some("cd /home/u\n")
        );
        assert_eq!(table.expand(&chord("ctrl-x"), &env), None);
    }

    #[traced_test]
    #[test]
    fn skip_policy_drops_bad_entries_and_logs() {
        let mut config = entries();
        config.push(SnippetEntry::new("ctrl-q", "\\q"));
        config.push(SnippetEntry::new("ctl-q", "ok"));

        let table = SnippetTable::from_entries(&config, LoadPolicy::SkipInvalid).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rejected().len(), 2);
        assert_eq!(table.rejected()[0].keys(), "ctrl-q");
        assert!(matches!(table.rejected()[1], BindingError::KeyChord { .. }));
        assert!(logs_contain("Skipping snippet"));
    }

    #[test]
    fn strict_policy_fails_on_first_bad_entry() {
        let mut config = entries();
        config.insert(1, SnippetEntry::new("ctrl-q", "${HOME"));
        config.push(SnippetEntry::new("ctrl-r", "\\"));

        let err = SnippetTable::from_entries(&config, LoadPolicy::Strict).unwrap_err();
        assert_eq!(err.keys(), "ctrl-q");
        assert!(matches!(
            err,
            BindingError::Snippet {
                source: SnippetError::UnterminatedBracedVariable { .. },
                ..
            }
        ));
    }

    #[test]
    fn policy_follows_config() {
        let config = Config {
            strict_snippets: true,
            snippets: vec![SnippetEntry::new("f1", "$")],
        };
        assert_eq!(LoadPolicy::from_config(&config), LoadPolicy::Strict);
        assert!(SnippetTable::from_config(&config).is_err());
        assert_eq!(LoadPolicy::from_config(&Config::default()), LoadPolicy::SkipInvalid);
    }

    #[traced_test]
    #[test]
    fn later_entry_overrides_earlier_chord() {
        let config = vec![
            SnippetEntry::new("ctrl-t", "first"),
            SnippetEntry::new("<Control>T", "second"),
        ];
        let table = SnippetTable::from_entries(&config, LoadPolicy::Strict).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.expand(&chord("ctrl-t"), &Variables::new()).as_deref(),
            Some("second")
        );
        assert!(logs_contain("overrides an earlier binding"));
    }

    #[test]
    fn oversized_template_is_rejected() {
        let entry = SnippetEntry::new("f2", "x".repeat(MAX_TEMPLATE_LENGTH + 1));
        let err = SnippetBinding::compile(&entry).unwrap_err();
        assert_eq!(
            err,
            BindingError::TooLong {
                keys: "f2".into(),
                field: "snippet",
                length: MAX_TEMPLATE_LENGTH + 1,
                limit: MAX_TEMPLATE_LENGTH,
            }
        );
    }

    #[test]
    fn bind_returns_replaced_binding() {
        let mut table = SnippetTable::new();
        assert!(table.bind(&SnippetEntry::new("f3", "a")).unwrap().is_none());
        let replaced = table.bind(&SnippetEntry::new("F3", "b")).unwrap().unwrap();
        assert_eq!(replaced.template, "a");
        assert!(table.bind(&SnippetEntry::new("f4", "\\z")).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dispatch_feeds_bound_snippet() {
        let table = SnippetTable::from_entries(&entries(), LoadPolicy::SkipInvalid).unwrap();
        let mut input = MockChildInput::new();
        input
            .expect_feed_child()
            .withf(|bytes| bytes.to_vec() == vec![0x03])
            .times(1)
            .returning(|_| Ok(()));

        let consumed = table
            .dispatch(&chord("alt-c"), &Variables::new(), &mut input)
            .unwrap();
        assert!(consumed);
    }

    #[test]
    fn dispatch_ignores_unbound_chord() {
        let table = SnippetTable::from_entries(&entries(), LoadPolicy::SkipInvalid).unwrap();
        let mut input = MockChildInput::new();
        input.expect_feed_child().never();

        let consumed = table
            .dispatch(&chord("alt-d"), &Variables::new(), &mut input)
            .unwrap();
        assert!(!consumed);
    }

    #[test]
    fn dispatch_propagates_input_errors() {
        let table = SnippetTable::from_entries(&entries(), LoadPolicy::SkipInvalid).unwrap();
        let mut input = MockChildInput::new();
        input
            .expect_feed_child()
            .returning(|_| Err(anyhow::anyhow!("child exited")));

        let err = table
            .dispatch(&chord("alt-c"), &Variables::new(), &mut input)
            .unwrap_err();
        assert_eq!(err.to_string(), "child exited");
    }
}
