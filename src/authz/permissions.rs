//! Admin permission flags.
//!
//! Five flags cover the admin areas of the site. Values are immutable;
//! every mutator returns a new set.

use serde::{Deserialize, Serialize};

/// A single permission area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKey {
    Reservations,
    Users,
    Devices,
    Cms,
    Settings,
}

impl PermissionKey {
    /// All keys, in canonical order.
    pub const ALL: [PermissionKey; 5] = [
        PermissionKey::Reservations,
        PermissionKey::Users,
        PermissionKey::Devices,
        PermissionKey::Cms,
        PermissionKey::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKey::Reservations => "reservations",
            PermissionKey::Users => "users",
            PermissionKey::Devices => "devices",
            PermissionKey::Cms => "cms",
            PermissionKey::Settings => "settings",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reservations" => Some(PermissionKey::Reservations),
            "users" => Some(PermissionKey::Users),
            "devices" => Some(PermissionKey::Devices),
            "cms" => Some(PermissionKey::Cms),
            "settings" => Some(PermissionKey::Settings),
            _ => None,
        }
    }
}

/// Permission flags for a regular admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPermissions {
    pub reservations: bool,
    pub users: bool,
    pub devices: bool,
    pub cms: bool,
    pub settings: bool,
}

impl Default for AdminPermissions {
    /// New admins manage everything except settings.
    fn default() -> Self {
        Self {
            reservations: true,
            users: true,
            devices: true,
            cms: true,
            settings: false,
        }
    }
}

impl AdminPermissions {
    /// Every flag set.
    pub fn full_access() -> Self {
        Self {
            reservations: true,
            users: true,
            devices: true,
            cms: true,
            settings: true,
        }
    }

    /// Reservations only.
    pub fn limited_access() -> Self {
        Self {
            reservations: true,
            users: false,
            devices: false,
            cms: false,
            settings: false,
        }
    }

    /// Build a set from a JSON object, merging the given keys over the
    /// defaults. Unknown keys and non-boolean values are rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, PermissionError> {
        Self::default().merged_with_json(json)
    }

    /// Return a copy with the given JSON object's keys merged over this set.
    pub fn merged_with_json(self, json: &serde_json::Value) -> Result<Self, PermissionError> {
        let object = json
            .as_object()
            .ok_or(PermissionError::NotAnObject)?;

        let mut merged = self;
        for (key, value) in object {
            let key = PermissionKey::from_str(key)
                .ok_or_else(|| PermissionError::InvalidKey(key.clone()))?;
            let value = value
                .as_bool()
                .ok_or(PermissionError::NotBoolean(key.as_str()))?;
            merged = merged.set(key, value);
        }
        Ok(merged)
    }

    pub fn has(&self, key: PermissionKey) -> bool {
        match key {
            PermissionKey::Reservations => self.reservations,
            PermissionKey::Users => self.users,
            PermissionKey::Devices => self.devices,
            PermissionKey::Cms => self.cms,
            PermissionKey::Settings => self.settings,
        }
    }

    pub fn has_any(&self, keys: &[PermissionKey]) -> bool {
        keys.iter().any(|&key| self.has(key))
    }

    pub fn has_all(&self, keys: &[PermissionKey]) -> bool {
        keys.iter().all(|&key| self.has(key))
    }

    /// Return a copy with one flag changed.
    pub fn set(self, key: PermissionKey, value: bool) -> Self {
        let mut next = self;
        match key {
            PermissionKey::Reservations => next.reservations = value,
            PermissionKey::Users => next.users = value,
            PermissionKey::Devices => next.devices = value,
            PermissionKey::Cms => next.cms = value,
            PermissionKey::Settings => next.settings = value,
        }
        next
    }

    pub fn grant(self, key: PermissionKey) -> Self {
        self.set(key, true)
    }

    pub fn revoke(self, key: PermissionKey) -> Self {
        self.set(key, false)
    }

    /// The granted keys, in canonical order.
    pub fn active_keys(&self) -> Vec<PermissionKey> {
        PermissionKey::ALL
            .into_iter()
            .filter(|&key| self.has(key))
            .collect()
    }

    /// Number of granted flags.
    pub fn count(&self) -> usize {
        PermissionKey::ALL.iter().filter(|&&key| self.has(key)).count()
    }

    /// Whether this set grants every flag the other set grants.
    pub fn includes(&self, other: &Self) -> bool {
        PermissionKey::ALL
            .iter()
            .all(|&key| !other.has(key) || self.has(key))
    }

    pub fn has_more_permissions_than(&self, other: &Self) -> bool {
        self.count() > other.count()
    }
}

/// Errors from parsing a permissions JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The JSON value was not an object
    NotAnObject,
    /// An unknown permission key
    InvalidKey(String),
    /// A value that is not a boolean (the key is reported)
    NotBoolean(&'static str),
}

impl std::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionError::NotAnObject => write!(f, "Permissions must be a JSON object"),
            PermissionError::InvalidKey(key) => write!(f, "Invalid permission key: {}", key),
            PermissionError::NotBoolean(key) => {
                write!(f, "Permission value must be boolean: {}", key)
            }
        }
    }
}

impl std::error::Error for PermissionError {}
