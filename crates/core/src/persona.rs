//! Persona system — parses character definitions into a fixed record.
//!
//! A persona file is plain UTF-8 text split into sections by heading lines:
//!
//! ```text
//! # Task
//! Keep the user company during late-night coding sessions.
//!
//! # Role
//! A dry-witted senior engineer.
//! ```
//!
//! Only eight section names are recognized (see [`PersonaSection`]). Heading
//! matching is case-insensitive. Content under any other heading is dropped,
//! and so is anything before the first heading. Blank lines are not kept.
//!
//! Loading never fails: an unreadable file logs a warning and yields a record
//! whose eight sections are all empty.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::PersonaError;

/// Prefix that marks a heading line.
pub const HEADING_PREFIX: &str = "# ";

/// The closed set of persona sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaSection {
    Task,
    Role,
    Appearance,
    Experience,
    Personality,
    ClassicLines,
    Preferences,
    Notes,
}

impl PersonaSection {
    /// All sections, in canonical order.
    pub const ALL: [PersonaSection; 8] = [
        Self::Task,
        Self::Role,
        Self::Appearance,
        Self::Experience,
        Self::Personality,
        Self::ClassicLines,
        Self::Preferences,
        Self::Notes,
    ];

    /// The record key for this section.
    pub fn key(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Role => "role",
            Self::Appearance => "appearance",
            Self::Experience => "experience",
            Self::Personality => "personality",
            Self::ClassicLines => "classic_lines",
            Self::Preferences => "preferences",
            Self::Notes => "notes",
        }
    }

    /// Resolve heading text (without the `# ` prefix) to a section.
    pub fn from_heading(heading: &str) -> Option<Self> {
        let name = heading.trim().to_lowercase();
        Self::ALL.into_iter().find(|s| s.key() == name)
    }
}

impl std::fmt::Display for PersonaSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A parsed persona. Every section is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub task: String,
    pub role: String,
    pub appearance: String,
    pub experience: String,
    pub personality: String,
    pub classic_lines: String,
    pub preferences: String,
    pub notes: String,
}

/// The section currently being accumulated by the parser.
enum OpenSection {
    Known(PersonaSection),
    Unknown(String),
}

impl PersonaRecord {
    /// Load a persona file. Never fails; see [`PersonaRecord::try_load`].
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(record) => record,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to read persona, using empty record");
                Self::default()
            }
        }
    }

    /// Load a persona file, reporting I/O failures to the caller.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, PersonaError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PersonaError::from_io(path, e))?;
        let record = Self::parse(&content);
        debug!(
            file = %path.display(),
            sections = record.populated().count(),
            "Persona loaded"
        );
        Ok(record)
    }

    /// Parse persona text.
    pub fn parse(text: &str) -> Self {
        let mut record = Self::default();
        let mut open: Option<OpenSection> = None;
        let mut body: Vec<&str> = Vec::new();

        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        for line in text.lines() {
            if let Some(heading) = line.strip_prefix(HEADING_PREFIX) {
                record.flush(open.take(), &mut body);
                open = Some(match PersonaSection::from_heading(heading) {
                    Some(section) => OpenSection::Known(section),
                    None => OpenSection::Unknown(heading.trim().to_string()),
                });
            } else if !line.trim().is_empty() {
                body.push(line);
            }
        }
        record.flush(open, &mut body);

        record
    }

    fn flush(&mut self, open: Option<OpenSection>, body: &mut Vec<&str>) {
        match open {
            Some(OpenSection::Known(section)) => {
                self.set(section, body.join("\n").trim());
            }
            Some(OpenSection::Unknown(heading)) => {
                if !body.is_empty() {
                    debug!(heading = %heading, lines = body.len(), "Dropping unrecognized persona section");
                }
            }
            // Text before the first heading has nowhere to go.
            None => {}
        }
        body.clear();
    }

    pub fn get(&self, section: PersonaSection) -> &str {
        match section {
            PersonaSection::Task => &self.task,
            PersonaSection::Role => &self.role,
            PersonaSection::Appearance => &self.appearance,
            PersonaSection::Experience => &self.experience,
            PersonaSection::Personality => &self.personality,
            PersonaSection::ClassicLines => &self.classic_lines,
            PersonaSection::Preferences => &self.preferences,
            PersonaSection::Notes => &self.notes,
        }
    }

    pub fn set(&mut self, section: PersonaSection, body: impl Into<String>) {
        let slot = match section {
            PersonaSection::Task => &mut self.task,
            PersonaSection::Role => &mut self.role,
            PersonaSection::Appearance => &mut self.appearance,
            PersonaSection::Experience => &mut self.experience,
            PersonaSection::Personality => &mut self.personality,
            PersonaSection::ClassicLines => &mut self.classic_lines,
            PersonaSection::Preferences => &mut self.preferences,
            PersonaSection::Notes => &mut self.notes,
        };
        *slot = body.into();
    }

    /// Sections with a non-empty body, in canonical order.
    pub fn populated(&self) -> impl Iterator<Item = (PersonaSection, &str)> {
        PersonaSection::ALL
            .into_iter()
            .map(|s| (s, self.get(s)))
            .filter(|(_, body)| !body.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.populated().next().is_none()
    }

    /// Render populated sections for system-prompt assembly.
    ///
    /// Format:
    /// ```text
    /// <task>
    /// {task body}
    /// </task>
    ///
    /// <role>
    /// {role body}
    /// </role>
    /// ```
    pub fn to_prompt(&self) -> String {
        let mut prompt = String::new();
        for (i, (section, body)) in self.populated().enumerate() {
            if i > 0 {
                prompt.push('\n');
            }
            let tag = section.key();
            prompt.push_str(&format!("<{tag}>\n{body}\n</{tag}>\n"));
        }
        prompt
    }
}
