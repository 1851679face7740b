use anyhow::Context;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared_types::GroupId;
use std::collections::HashSet;

use crate::events::EventSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// IANA timezone the feed's minute offsets are expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Calendar event title; `{group}` is replaced with the group id
    #[serde(default = "default_summary_template")]
    pub summary_template: String,

    /// Groups to reconcile. Empty means every group in the payload.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group id as it appears in the feed (e.g. "1.1")
    pub id: GroupId,

    /// Calendar that holds this group's outage events
    pub calendar_id: String,
}

fn default_timezone() -> String {
    "Europe/Kyiv".to_string()
}

fn default_summary_template() -> String {
    "Power outage (group {group})".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timezone: default_timezone(),
            summary_template: default_summary_template(),
            groups: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Each group may be listed once; two entries would race on the same
    /// snapshot and calendar.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            if !seen.insert(&group.id) {
                anyhow::bail!("Group {} is configured more than once", group.id);
            }
        }
        Ok(())
    }

    pub fn example() -> Self {
        Config {
            timezone: default_timezone(),
            summary_template: default_summary_template(),
            groups: vec![GroupConfig {
                id: GroupId::from("1.1"),
                calendar_id: "outages-1.1@group.calendar.google.com".to_string(),
            }],
        }
    }

    pub fn tz(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", self.timezone))
    }

    pub fn event_settings(&self) -> anyhow::Result<EventSettings> {
        Ok(EventSettings {
            timezone: self.tz()?,
            summary_template: self.summary_template.clone(),
        })
    }

    /// Resolve which groups to reconcile against a given set of feed groups.
    /// Unconfigured runs use the group id as its calendar id. Each group id
    /// appears at most once; the first entry wins.
    pub fn targets<'a>(&self, feed_groups: impl IntoIterator<Item = &'a GroupId>) -> Vec<GroupConfig> {
        let candidates: Vec<GroupConfig> = if self.groups.is_empty() {
            feed_groups
                .into_iter()
                .map(|id| GroupConfig {
                    id: id.clone(),
                    calendar_id: id.to_string(),
                })
                .collect()
        } else {
            self.groups.clone()
        };

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|target| {
                let first = seen.insert(target.id.clone());
                if !first {
                    tracing::warn!("Group {} listed more than once, ignoring duplicate", target.id);
                }
                first
            })
            .collect()
    }
}
