use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SirenKind {
    Android,
    Ios,
    Windows,
    Macos,
    Linux,
    Websites,
    Keywords,
}

impl SirenKind {
    /// Fixed category order used wherever sirens are flattened into text.
    pub const ALL: [SirenKind; 7] = [
        SirenKind::Android,
        SirenKind::Ios,
        SirenKind::Windows,
        SirenKind::Macos,
        SirenKind::Linux,
        SirenKind::Websites,
        SirenKind::Keywords,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
            Self::Websites => "websites",
            Self::Keywords => "keywords",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for SirenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AndroidSiren {
    pub package_name: String,
    pub app_name: String,
}

impl AndroidSiren {
    pub fn new(package_name: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            app_name: app_name.into(),
        }
    }
}

/// Blockable targets grouped by category. A siren is identified by its
/// value: the package name for android, the raw string everywhere else.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Sirens {
    pub android: Vec<AndroidSiren>,
    pub ios: Vec<String>,
    pub windows: Vec<String>,
    pub macos: Vec<String>,
    pub linux: Vec<String>,
    pub websites: Vec<String>,
    pub keywords: Vec<String>,
}

impl Sirens {
    pub fn is_empty(&self) -> bool {
        SirenKind::ALL
            .into_iter()
            .all(|kind| self.ids(kind).is_empty())
    }

    /// Siren identities of one category, in stored order.
    pub fn ids(&self, kind: SirenKind) -> Vec<&str> {
        match kind {
            SirenKind::Android => self
                .android
                .iter()
                .map(|siren| siren.package_name.as_str())
                .collect(),
            other => self
                .strings(other)
                .map(|values| values.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        }
    }

    pub fn contains(&self, kind: SirenKind, siren_id: &str) -> bool {
        self.ids(kind).into_iter().any(|id| id == siren_id)
    }

    /// Appends every siren of `other` that is not already present.
    pub fn merge(&mut self, other: &Sirens) {
        for siren in &other.android {
            if !self.contains(SirenKind::Android, &siren.package_name) {
                self.android.push(siren.clone());
            }
        }
        for kind in SirenKind::ALL {
            let Some(incoming) = other.strings(kind) else {
                continue;
            };
            let Some(target) = self.strings_mut(kind) else {
                continue;
            };
            for value in incoming {
                if !target.contains(value) {
                    target.push(value.clone());
                }
            }
        }
    }

    /// Adds a siren; returns false when it was already present.
    pub fn insert(&mut self, kind: SirenKind, siren_id: &str) -> bool {
        if self.contains(kind, siren_id) {
            return false;
        }
        match kind {
            SirenKind::Android => self.android.push(AndroidSiren::new(siren_id, siren_id)),
            other => {
                if let Some(values) = self.strings_mut(other) {
                    values.push(siren_id.to_string());
                }
            }
        }
        true
    }

    /// Removes a siren; returns false when it was not present.
    pub fn remove(&mut self, kind: SirenKind, siren_id: &str) -> bool {
        match kind {
            SirenKind::Android => {
                let before = self.android.len();
                self.android.retain(|siren| siren.package_name != siren_id);
                self.android.len() != before
            }
            other => match self.strings_mut(other) {
                Some(values) => {
                    let before = values.len();
                    values.retain(|value| value != siren_id);
                    values.len() != before
                }
                None => false,
            },
        }
    }

    fn strings(&self, kind: SirenKind) -> Option<&Vec<String>> {
        match kind {
            SirenKind::Android => None,
            SirenKind::Ios => Some(&self.ios),
            SirenKind::Windows => Some(&self.windows),
            SirenKind::Macos => Some(&self.macos),
            SirenKind::Linux => Some(&self.linux),
            SirenKind::Websites => Some(&self.websites),
            SirenKind::Keywords => Some(&self.keywords),
        }
    }

    fn strings_mut(&mut self, kind: SirenKind) -> Option<&mut Vec<String>> {
        match kind {
            SirenKind::Android => None,
            SirenKind::Ios => Some(&mut self.ios),
            SirenKind::Windows => Some(&mut self.windows),
            SirenKind::Macos => Some(&mut self.macos),
            SirenKind::Linux => Some(&mut self.linux),
            SirenKind::Websites => Some(&mut self.websites),
            SirenKind::Keywords => Some(&mut self.keywords),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Blocklist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sirens: Sirens,
}

impl Blocklist {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "blocklist.id")?;
        validate_non_empty(&self.name, "blocklist.name")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub device_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockSession {
    pub id: String,
    pub name: String,
    /// Wall-clock `HH:mm`, no date.
    pub started_at: String,
    /// Wall-clock `HH:mm`; earlier than `started_at` when the window crosses midnight.
    pub ended_at: String,
    #[serde(default)]
    pub blocklist_ids: Vec<String>,
    /// Embedded copies, consulted only for ids missing from the shared blocklists.
    #[serde(default)]
    pub blocklists: Vec<Blocklist>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub blocking_conditions: Vec<String>,
    #[serde(default)]
    pub start_notification_id: Option<String>,
    #[serde(default)]
    pub end_notification_id: Option<String>,
}

impl BlockSession {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "session.id")?;
        validate_non_empty(&self.name, "session.name")?;
        validate_hhmm(&self.started_at, "session.started_at")?;
        validate_hhmm(&self.ended_at, "session.ended_at")?;
        for blocklist_id in &self.blocklist_ids {
            validate_non_empty(blocklist_id, "session.blocklist_ids[]")?;
        }
        Ok(())
    }

    pub fn window(&self) -> Option<TimeWindow> {
        Some(TimeWindow {
            start: parse_hhmm(&self.started_at)?,
            end: parse_hhmm(&self.ended_at)?,
        })
    }

    /// Sessions without devices apply everywhere.
    pub fn applies_to_device(&self, device_id: &str) -> bool {
        self.devices.is_empty() || self.devices.iter().any(|device| device.id == device_id)
    }
}

/// A daily recurring time-of-day window, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn crosses_midnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Enforcement-facing projection of one session. Derived, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockingSchedule {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub sirens: Sirens,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StrictModeTimer {
    /// ISO-8601 instant.
    pub ended_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockedSirens {
    pub android: HashSet<String>,
    pub websites: HashSet<String>,
    pub keywords: HashSet<String>,
}

impl LockedSirens {
    pub fn is_empty(&self) -> bool {
        self.android.is_empty() && self.websites.is_empty() && self.keywords.is_empty()
    }

    pub fn absorb(&mut self, sirens: &Sirens) {
        self.android
            .extend(sirens.android.iter().map(|siren| siren.package_name.clone()));
        self.websites.extend(sirens.websites.iter().cloned());
        self.keywords.extend(sirens.keywords.iter().cloned());
    }
}

pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

/// Accepts exactly what `window` can parse.
fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| format!("{field_name} must be HH:mm"))
}
