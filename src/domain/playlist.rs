use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A playlist entry as returned by the Web API.
///
/// Only `name` is interpreted; every other field is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the current user's playlists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaylistPage {
    #[serde(default)]
    pub items: Vec<Playlist>,
}

impl PlaylistPage {
    /// First playlist, in provider order, whose name contains `needle`.
    #[must_use]
    pub fn find_by_name(&self, needle: &str) -> Option<&Playlist> {
        self.items.iter().find(|p| p.name.contains(needle))
    }
}
