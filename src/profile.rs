//! Profile data model.
//!
//! A profile is a named, ordered set of widget placements. The whole list is what
//! gets persisted, so reconciliation (upsert on save, removal of emptied profiles)
//! lives here next to the types.

use crate::constants::{DEFAULT_ENTRY_POSITION, DEFAULT_ENTRY_SIZE, MEDIA_WIDGET_KIND};
use crate::geometry::{Rect, Size};
use serde::{Deserialize, Deserializer, Serialize};

/// Widget types this build knows how to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Media,
}

impl WidgetKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            MEDIA_WIDGET_KIND => Some(Self::Media),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Media => MEDIA_WIDGET_KIND,
        }
    }
}

/// Serialized form of one placed widget.
///
/// `kind` stays a raw string so entries written by newer versions survive a load
/// and can be reported by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetEntry {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub path: String,
    #[serde(default = "default_position")]
    pub x: i32,
    #[serde(default = "default_position")]
    pub y: i32,
    #[serde(default = "default_size")]
    pub width: i32,
    #[serde(default = "default_size")]
    pub height: i32,
}

fn default_kind() -> String {
    MEDIA_WIDGET_KIND.to_string()
}

fn default_position() -> i32 {
    DEFAULT_ENTRY_POSITION
}

fn default_size() -> i32 {
    DEFAULT_ENTRY_SIZE
}

impl WidgetEntry {
    pub fn media(path: impl Into<String>, geometry: Rect) -> Self {
        Self {
            kind: default_kind(),
            path: path.into(),
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
        }
    }

    pub fn widget_kind(&self) -> Option<WidgetKind> {
        WidgetKind::parse(&self.kind)
    }

    /// Saved geometry, with non-positive sizes clamped to one pixel.
    pub fn geometry(&self) -> Rect {
        let size = Size::new(self.width, self.height).at_least_one();
        Rect::new(self.x, self.y, size.width, size.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, alias = "media", deserialize_with = "lenient_entries")]
    pub widgets: Vec<WidgetEntry>,
}

/// Reads each entry on its own so one unreadable entry (say, a future widget type
/// with different fields) costs only itself and not the whole file.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<WidgetEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<WidgetEntry>(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Skipping unreadable widget entry: {err}");
                None
            }
        })
        .collect())
}

impl Profile {
    pub fn new(name: impl Into<String>, widgets: Vec<WidgetEntry>) -> Self {
        Self {
            name: name.into(),
            widgets,
        }
    }
}

/// The ordered list of profiles, at most one per name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profiles(Vec<Profile>);

impl Profiles {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self(profiles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.name.as_str())
    }

    pub fn find(&self, name: &str) -> Option<&Profile> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Appends a profile unless the name is taken. Returns whether it was added.
    pub fn push(&mut self, profile: Profile) -> bool {
        if self.contains(&profile.name) {
            return false;
        }
        self.0.push(profile);
        true
    }

    /// Replaces the widget list of `name`, appending a new profile if none exists.
    pub fn upsert(&mut self, name: &str, widgets: Vec<WidgetEntry>) {
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(profile) => profile.widgets = widgets,
            None => self.0.push(Profile::new(name, widgets)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Profile> {
        let index = self.0.iter().position(|p| p.name == name)?;
        Some(self.0.remove(index))
    }

    /// Drops later duplicates of a name, keeping the first occurrence.
    pub fn dedup_names(&mut self) -> usize {
        let before = self.0.len();
        let mut seen = std::collections::HashSet::new();
        self.0.retain(|p| seen.insert(p.name.clone()));
        before - self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> WidgetEntry {
        WidgetEntry::media(path, Rect::new(1, 2, 3, 4))
    }

    #[test]
    fn test_entry_defaults_for_missing_fields() {
        let parsed: WidgetEntry = serde_json::from_str(r#"{"path":"a.png"}"#).unwrap();
        assert_eq!(parsed.kind, "media");
        assert_eq!(parsed.geometry(), Rect::new(100, 100, 150, 150));
        assert_eq!(parsed.widget_kind(), Some(WidgetKind::Media));
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let parsed: WidgetEntry =
            serde_json::from_str(r#"{"type":"sticker","path":"s.png","x":0,"y":0,"width":5,"height":5}"#)
                .unwrap();
        assert_eq!(parsed.kind, "sticker");
        assert_eq!(parsed.widget_kind(), None);
    }

    #[test]
    fn test_entry_with_foreign_shape_is_skipped_not_fatal() {
        let parsed: Vec<Profile> = serde_json::from_str(
            r#"[
                {"name":"Default","widgets":[{"type":"media","path":"a.png"}]},
                {"name":"Work","widgets":[
                    {"type":"note","text":"hi","x":0,"y":0},
                    {"type":"media","path":"w.png","x":"left"},
                    {"type":"media","path":"ok.png","x":3,"y":4,"width":5,"height":6}
                ]}
            ]"#,
        )
        .unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].widgets, vec![WidgetEntry::media("a.png", Rect::new(100, 100, 150, 150))]);
        assert_eq!(parsed[1].widgets, vec![WidgetEntry::media("ok.png", Rect::new(3, 4, 5, 6))]);
    }

    #[test]
    fn test_legacy_media_key_is_accepted() {
        let parsed: Profile =
            serde_json::from_str(r#"{"name":"Old","media":[{"path":"x.gif","x":5,"y":6,"width":7,"height":8}]}"#)
                .unwrap();
        assert_eq!(parsed.widgets.len(), 1);
        assert_eq!(parsed.widgets[0].geometry(), Rect::new(5, 6, 7, 8));

        let written = serde_json::to_string(&parsed).unwrap();
        assert!(written.contains("\"widgets\""));
        assert!(!written.contains("\"media\":["));
    }

    #[test]
    fn test_geometry_clamps_non_positive_size() {
        let mut e = entry("a.png");
        e.width = 0;
        e.height = -10;
        assert_eq!(e.geometry().size(), Size::new(1, 1));
    }

    #[test]
    fn test_upsert_replaces_or_appends() {
        let mut profiles = Profiles::new(vec![Profile::new("Default", vec![entry("a.png")])]);

        profiles.upsert("Default", vec![entry("b.png"), entry("c.png")]);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles.find("Default").unwrap().widgets.len(), 2);

        profiles.upsert("Work", vec![entry("d.png")]);
        assert_eq!(profiles.names().collect::<Vec<_>>(), vec!["Default", "Work"]);
    }

    #[test]
    fn test_push_rejects_duplicate_names() {
        let mut profiles = Profiles::default();
        assert!(profiles.push(Profile::new("Work", vec![])));
        assert!(!profiles.push(Profile::new("Work", vec![entry("a.png")])));
        assert_eq!(profiles.len(), 1);
        assert!(profiles.find("Work").unwrap().widgets.is_empty());
    }

    #[test]
    fn test_remove_and_dedup() {
        let mut profiles = Profiles::new(vec![
            Profile::new("A", vec![]),
            Profile::new("B", vec![]),
            Profile::new("A", vec![entry("dup.png")]),
        ]);
        assert_eq!(profiles.dedup_names(), 1);
        assert!(profiles.find("A").unwrap().widgets.is_empty());

        assert!(profiles.remove("B").is_some());
        assert!(profiles.remove("B").is_none());
        assert_eq!(profiles.len(), 1);
    }
}
