use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a subscribed user receives a digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    /// Every day
    #[default]
    Daily,
    /// Mondays only
    Weekly,
    /// Monday to Friday
    Weekdays,
}

impl DigestFrequency {
    /// Whether a digest is scheduled on the given weekday
    pub fn runs_on(self, day: Weekday) -> bool {
        match self {
            DigestFrequency::Daily => true,
            DigestFrequency::Weekly => day == Weekday::Mon,
            DigestFrequency::Weekdays => !matches!(day, Weekday::Sat | Weekday::Sun),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DigestFrequency::Daily => "daily",
            DigestFrequency::Weekly => "weekly",
            DigestFrequency::Weekdays => "weekdays",
        }
    }

    /// Human readable description used in bot replies
    pub fn describe(self) -> &'static str {
        match self {
            DigestFrequency::Daily => "every day",
            DigestFrequency::Weekly => "every Monday",
            DigestFrequency::Weekdays => "Monday to Friday",
        }
    }
}

impl fmt::Display for DigestFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestFrequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(DigestFrequency::Daily),
            "weekly" => Ok(DigestFrequency::Weekly),
            "weekdays" => Ok(DigestFrequency::Weekdays),
            other => Err(anyhow::anyhow!(
                "Unknown frequency '{}'. Use daily, weekly or weekdays",
                other
            )),
        }
    }
}

/// An article bookmarked with `/save`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub saved_at: DateTime<Utc>,
}

impl SavedArticle {
    /// The link, or the title for articles without one
    fn key(&self) -> &str {
        if self.url.is_empty() {
            &self.title
        } else {
            &self.url
        }
    }
}

/// Per-user subscription and delivery preferences.
///
/// A profile is subscribed to digests exactly when `digest_time` is set.
/// An empty topic list means the default feed, and an empty source list
/// means every configured provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub topics: Vec<String>,
    pub digest_time: Option<NaiveTime>,
    pub frequency: DigestFrequency,
    pub last_sent: Option<DateTime<Utc>>,
    pub sources: Vec<String>,
    /// Overrides `NEWS_LANGUAGE` for this user
    pub language: Option<String>,
    /// Overrides `NEWS_REGION` for this user
    pub region: Option<String>,
    pub saved: Vec<SavedArticle>,
}

impl UserProfile {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            topics: Vec::new(),
            digest_time: None,
            frequency: DigestFrequency::default(),
            last_sent: None,
            sources: Vec::new(),
            language: None,
            region: None,
            saved: Vec::new(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.digest_time.is_some()
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        let needle = topic.trim().to_lowercase();
        self.topics.iter().any(|t| t.to_lowercase() == needle)
    }

    /// Adds a topic, returning `false` when it was already present
    pub fn add_topic(&mut self, topic: &str) -> bool {
        let topic = topic.trim();
        if topic.is_empty() || self.has_topic(topic) {
            return false;
        }
        self.topics.push(topic.to_string());
        true
    }

    /// Removes a topic (case-insensitive), returning `false` when it was absent
    pub fn remove_topic(&mut self, topic: &str) -> bool {
        let needle = topic.trim().to_lowercase();
        let before = self.topics.len();
        self.topics.retain(|t| t.to_lowercase() != needle);
        self.topics.len() != before
    }

    /// Renames the topic at `index`; `Err` carries the reason shown to the user
    pub fn rename_topic(&mut self, index: usize, new_name: &str) -> Result<String, String> {
        let new_name = new_name.trim();
        if index >= self.topics.len() {
            return Err(format!("There is no topic number {}", index + 1));
        }
        let needle = new_name.to_lowercase();
        let taken = self
            .topics
            .iter()
            .enumerate()
            .any(|(i, t)| i != index && t.to_lowercase() == needle);
        if taken {
            return Err(format!("You already follow '{new_name}'"));
        }
        Ok(std::mem::replace(&mut self.topics[index], new_name.to_string()))
    }

    /// Bookmarks an article, returning `false` when it is already saved
    pub fn save_article(&mut self, article: SavedArticle) -> bool {
        if self.saved.iter().any(|s| s.key() == article.key()) {
            return false;
        }
        self.saved.push(article);
        true
    }

    pub(crate) fn from_record(id: i64, record: ProfileRecord) -> Self {
        let mut profile = Self {
            id,
            topics: Vec::with_capacity(record.topics.len()),
            digest_time: record.digest_time,
            frequency: record.frequency,
            last_sent: record.last_sent,
            sources: record.sources,
            language: record.language,
            region: record.region,
            saved: record.saved,
        };
        // Hand-edited files may contain duplicates
        for topic in &record.topics {
            profile.add_topic(topic);
        }
        profile
    }

    pub(crate) fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            topics: self.topics.clone(),
            digest_time: self.digest_time,
            last_sent: self.last_sent,
            frequency: self.frequency,
            sources: self.sources.clone(),
            language: self.language.clone(),
            region: self.region.clone(),
            saved: self.saved.clone(),
        }
    }
}

/// On-disk shape of a profile, keyed by user id in the state file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileRecord {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, with = "hhmm")]
    pub digest_time: Option<NaiveTime>,
    #[serde(default)]
    pub last_sent: Option<DateTime<Utc>>,
    #[serde(default)]
    pub frequency: DigestFrequency,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub saved: Vec<SavedArticle>,
}

/// `"HH:MM"` or `null`
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| NaiveTime::parse_from_str(s.trim(), FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}
