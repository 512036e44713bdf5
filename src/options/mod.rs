//! Option declarations and deprecated-alias resolution
//!
//! Every loader describes its inputs as an ordered list of [`OptionSpec`]
//! values. An [`OptionRegistry`] indexes those specs once and turns a raw
//! key/value mapping (from a config file, environment or caller) into a
//! [`ResolvedOptions`] keyed by canonical option names.
//!
//! # Alias rules
//!
//! - A raw key may be a canonical name, its dest field name or one of its
//!   deprecated aliases; `_` and `-` are interchangeable
//!   (`project_id` == `project-id`).
//! - An alias value is copied to the canonical key unless the canonical key
//!   has a non-empty value too, in which case the canonical value wins and
//!   the alias is ignored.
//! - Unknown keys are dropped.
//!
//! # Examples
//!
//! ```
//! use kgauth::options::{OptionRegistry, OptionSpec, RawOptions};
//!
//! let registry = OptionRegistry::new(vec![
//!     OptionSpec::new("project-id", "Project ID to scope to").deprecated("tenant-id"),
//! ])
//! .unwrap();
//!
//! let mut raw = RawOptions::new();
//! raw.insert("tenant-id".to_string(), "abc".to_string());
//!
//! let resolved = registry.resolve(&raw);
//! assert_eq!(resolved.get("project-id"), Some("abc"));
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{AuthError, Result};

/// Raw option mapping as supplied by configuration, keys not yet resolved
pub type RawOptions = BTreeMap<String, String>;

/// Declaration of a single named option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    /// Canonical, hyphenated option name (e.g. `project-id`)
    pub name: String,
    /// Field name the value lands in on the credential
    pub dest: String,
    /// Help text shown by the CLI
    pub help: String,
    /// Deprecated names that resolve to this option, in declaration order
    pub deprecated: Vec<String>,
    /// Value must be masked when displayed
    pub secret: bool,
    /// Loading fails when the option has no value
    pub required: bool,
}

impl OptionSpec {
    /// Creates a spec whose dest is derived from the name
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        let name = name.into();
        let dest = name.replace('-', "_");
        Self {
            name,
            dest,
            help: help.into(),
            deprecated: Vec::new(),
            secret: false,
            required: false,
        }
    }

    /// Overrides the destination field name
    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = dest.into();
        self
    }

    /// Adds a deprecated alias
    pub fn deprecated(mut self, alias: impl Into<String>) -> Self {
        self.deprecated.push(alias.into());
        self
    }

    /// Marks the option as secret
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Marks the option as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Environment variables that may carry this option, canonical first
    ///
    /// # Examples
    ///
    /// ```
    /// use kgauth::options::OptionSpec;
    ///
    /// let spec = OptionSpec::new("user-name", "Username").deprecated("username");
    /// assert_eq!(spec.env_vars(), vec!["OS_USER_NAME", "OS_USERNAME"]);
    /// ```
    pub fn env_vars(&self) -> Vec<String> {
        std::iter::once(&self.name)
            .chain(self.deprecated.iter())
            .map(|n| format!("OS_{}", n.replace('-', "_").to_uppercase()))
            .collect()
    }
}

/// Option mapping keyed by canonical option name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedOptions(BTreeMap<String, String>);

impl ResolvedOptions {
    /// Returns the value for a canonical name, treating empty strings as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Owned variant of [`get`](Self::get)
    pub fn get_owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Sets a canonical key
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Consume into the underlying map
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Canonical,
    Alias,
}

/// Index over a loader's option specs
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    specs: Vec<OptionSpec>,
    lookup: HashMap<String, (usize, KeyKind)>,
}

fn normalize(key: &str) -> String {
    key.trim().replace('_', "-").to_lowercase()
}

impl OptionRegistry {
    /// Builds the registry, rejecting names that resolve ambiguously
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when a canonical name, dest or
    /// alias is declared by more than one option.
    pub fn new(specs: Vec<OptionSpec>) -> Result<Self> {
        let mut lookup: HashMap<String, (usize, KeyKind)> = HashMap::new();

        for (idx, spec) in specs.iter().enumerate() {
            // dest last: it may repeat the option's own name or alias
            let keys = std::iter::once((&spec.name, KeyKind::Canonical))
                .chain(spec.deprecated.iter().map(|a| (a, KeyKind::Alias)))
                .chain(std::iter::once((&spec.dest, KeyKind::Canonical)));

            for (key, kind) in keys {
                let normalized = normalize(key);
                if let Some(&(other, _)) = lookup.get(&normalized) {
                    if other == idx {
                        continue;
                    }
                    return Err(AuthError::Configuration(format!(
                        "option name '{}' declared by both '{}' and '{}'",
                        key, specs[other].name, spec.name
                    ))
                    .into());
                }
                lookup.insert(normalized, (idx, kind));
            }
        }

        Ok(Self { specs, lookup })
    }

    /// Declared specs in order
    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    /// Finds a spec by canonical name or alias
    pub fn find(&self, key: &str) -> Option<&OptionSpec> {
        self.lookup
            .get(&normalize(key))
            .map(|(idx, _)| &self.specs[*idx])
    }

    /// Returns true when the canonical option is marked secret
    pub fn is_secret(&self, name: &str) -> bool {
        self.find(name).map(|s| s.secret).unwrap_or(false)
    }

    /// Resolves a raw mapping into canonical names
    ///
    /// Keys are visited in sorted order. When one option arrives under
    /// several spellings of the same kind, the first non-empty value wins.
    pub fn resolve(&self, raw: &RawOptions) -> ResolvedOptions {
        let mut resolved = ResolvedOptions::default();
        let mut sources: HashMap<&str, (&str, KeyKind)> = HashMap::new();
        let mut aliased: Vec<(&str, &str, &str)> = Vec::new();

        for (key, value) in raw {
            match self.lookup.get(&normalize(key)) {
                Some((idx, KeyKind::Canonical)) => {
                    let name = self.specs[*idx].name.as_str();
                    if let Some((first, _)) = sources.get(name) {
                        tracing::warn!(
                            option = %name,
                            first = %first,
                            second = %key,
                            "Option given in more than one spelling"
                        );
                        if resolved.get(name).is_some() {
                            continue;
                        }
                    }
                    resolved.insert(name, value.clone());
                    sources.insert(name, (key.as_str(), KeyKind::Canonical));
                }
                Some((idx, KeyKind::Alias)) => {
                    aliased.push((self.specs[*idx].name.as_str(), key.as_str(), value.as_str()));
                }
                None => {
                    tracing::debug!(option = %key, "Ignoring unknown option");
                }
            }
        }

        for (name, alias, value) in aliased {
            if resolved.get(name).is_some() {
                match sources.get(name) {
                    Some((first, KeyKind::Alias)) => tracing::warn!(
                        option = %name,
                        first = %first,
                        second = %alias,
                        "Deprecated option given in more than one spelling"
                    ),
                    _ => tracing::info!(
                        option = %name,
                        deprecated = %alias,
                        "Both option and its deprecated alias are set, ignoring the alias"
                    ),
                }
                continue;
            }
            tracing::warn!(
                option = %name,
                deprecated = %alias,
                "Deprecated option name in use"
            );
            resolved.insert(name, value);
            sources.insert(name, (alias, KeyKind::Alias));
        }

        resolved
    }

    /// Re-keys resolved options by each spec's `dest` field name
    ///
    /// Options without a value are left out.
    ///
    /// # Examples
    ///
    /// ```
    /// use kgauth::options::{OptionRegistry, OptionSpec, RawOptions};
    ///
    /// let registry = OptionRegistry::new(vec![
    ///     OptionSpec::new("user-name", "Username").with_dest("username"),
    /// ])
    /// .unwrap();
    ///
    /// let mut raw = RawOptions::new();
    /// raw.insert("user-name".to_string(), "alice".to_string());
    ///
    /// let fields = registry.fields(&registry.resolve(&raw));
    /// assert_eq!(fields.get("username"), Some("alice"));
    /// ```
    pub fn fields(&self, resolved: &ResolvedOptions) -> ResolvedOptions {
        let mut fields = ResolvedOptions::default();
        for spec in &self.specs {
            if let Some(value) = resolved.get(&spec.name) {
                fields.insert(spec.dest.clone(), value);
            }
        }
        fields
    }

    /// Canonical names of required options without a value
    pub fn missing_required(&self, resolved: &ResolvedOptions) -> Vec<String> {
        self.specs
            .iter()
            .filter(|s| s.required && resolved.get(&s.name).is_none())
            .map(|s| s.name.clone())
            .collect()
    }

    /// Copy of `resolved` with secret values masked, for display
    pub fn masked(&self, resolved: &ResolvedOptions) -> ResolvedOptions {
        let mut out = ResolvedOptions::default();
        for (k, v) in resolved.as_map() {
            if self.is_secret(k) {
                out.insert(k.clone(), "********");
            } else {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }
}
