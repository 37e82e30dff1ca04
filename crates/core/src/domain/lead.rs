use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single timestamped remark on a lead. Immutable once written; the
/// containing list is kept newest-first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// A prospective customer account. The identifier is derived from the name
/// at creation time and never reassigned afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub hq: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub founded: Option<i32>,
    #[serde(default)]
    pub employees: Option<u32>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Lead {
    /// Case-insensitive substring match over name, HQ, industry, and
    /// product names. An empty or whitespace-only query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        let mut haystack = String::new();
        haystack.push_str(&self.name);
        haystack.push(' ');
        haystack.push_str(&self.hq);
        haystack.push(' ');
        haystack.push_str(&self.industry);
        for product in &self.products {
            haystack.push(' ');
            haystack.push_str(product);
        }

        haystack.to_lowercase().contains(&query)
    }

    /// Returns a copy of the extra map with `entries` merged in, later
    /// entries winning on key collision. Pure; callers persist the result
    /// through a store update.
    pub fn merged_extra(
        &self,
        entries: impl IntoIterator<Item = (String, Value)>,
    ) -> Map<String, Value> {
        let mut merged = self.extra.clone();
        for (key, value) in entries {
            merged.insert(key, value);
        }
        merged
    }
}

/// Fields accepted when creating a lead. The store derives the identifier
/// and initializes notes and extra attributes empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadDraft {
    pub name: String,
    pub website: String,
    pub hq: String,
    pub industry: String,
    pub founded: Option<i32>,
    pub employees: Option<u32>,
    pub products: Vec<String>,
}

/// A partial update. Only the fields present here can be patched; when a
/// patch is decoded from JSON, keys outside this set are dropped by serde
/// and never reach the store. An absent field leaves the lead unchanged.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub website: Option<String>,
    pub hq: Option<String>,
    pub industry: Option<String>,
    pub founded: Option<i32>,
    pub employees: Option<u32>,
    pub products: Option<Vec<String>>,
    pub extra: Option<Map<String, Value>>,
    pub notes: Option<Vec<Note>>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.website.is_none()
            && self.hq.is_none()
            && self.industry.is_none()
            && self.founded.is_none()
            && self.employees.is_none()
            && self.products.is_none()
            && self.extra.is_none()
            && self.notes.is_none()
    }
}
