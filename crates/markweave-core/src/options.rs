//! Parser configuration.

use std::fmt;
use std::str::FromStr;

/// Default bound on container nesting (block quotes and list items).
pub const DEFAULT_MAX_NESTING: usize = 64;

/// Parsing profile that selects the default set of extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Plain CommonMark, no extensions.
    CommonMark,
    /// CommonMark with every extension enabled.
    #[default]
    Extended,
}

impl Profile {
    /// Extensions enabled by this profile.
    pub fn extensions(self) -> &'static [Extension] {
        match self {
            Profile::CommonMark => &[],
            Profile::Extended => Extension::ALL,
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commonmark" | "cm" => Ok(Profile::CommonMark),
            "extended" | "ext" => Ok(Profile::Extended),
            other => Err(format!("unknown profile: {}", other)),
        }
    }
}

/// Optional syntax on top of CommonMark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    /// Pipe tables with a delimiter row.
    Tables,
    /// `~text~` and `~~text~~`.
    Strikethrough,
    /// `$$` math blocks and `$`/`$$` inline math.
    Math,
    /// `[[destination|display]]`
    WikiLinks,
    /// `![[source|attribute]]`
    EmbeddedFiles,
    /// Bare `www.`, `http(s)://`, `mailto:`, `xmpp:` and email links.
    ExtendedAutolinks,
}

impl Extension {
    pub const ALL: &'static [Extension] = &[
        Extension::Tables,
        Extension::Strikethrough,
        Extension::Math,
        Extension::WikiLinks,
        Extension::EmbeddedFiles,
        Extension::ExtendedAutolinks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Extension::Tables => "tables",
            Extension::Strikethrough => "strikethrough",
            Extension::Math => "math",
            Extension::WikiLinks => "wikilinks",
            Extension::EmbeddedFiles => "embeds",
            Extension::ExtendedAutolinks => "autolinks",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Extension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Extension::ALL
            .iter()
            .copied()
            .find(|ext| ext.name() == s)
            .ok_or_else(|| format!("unknown extension: {}", s))
    }
}

/// Resolved parser options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    extensions: Vec<Extension>,
    pub max_nesting: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_profile(Profile::default())
    }
}

impl Options {
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            extensions: profile.extensions().to_vec(),
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Check if the given extension is enabled.
    #[inline]
    pub fn has(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }

    pub fn enable(&mut self, extension: Extension) {
        if !self.has(extension) {
            self.extensions.push(extension);
        }
    }

    pub fn disable(&mut self, extension: Extension) {
        self.extensions.retain(|e| *e != extension);
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }
}
