use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use leadmate_core::{Lead, LeadDraft, LeadId, LeadPatch, Note};

use crate::slug::slugify;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read lead store `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write lead store `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not parse lead store `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("could not serialize lead store `{path}`: {source}")]
    Serialize { path: PathBuf, source: serde_json::Error },
    #[error("lead not found: {0}")]
    NotFound(String),
}

/// Owns the lead collection and its backing file. Every mutation takes
/// `&mut self`, so a second caller cannot alias the collection while a run
/// is mutating it.
pub struct LeadStore {
    path: PathBuf,
    leads: Vec<Lead>,
}

impl LeadStore {
    /// Loads the collection from `path`, creating an empty backing file
    /// (and its parent directory) when none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .map_err(|source| StoreError::Write { path: path.clone(), source })?;
                }
            }
            write_pretty(&path, &[])?;
        }

        let raw = fs::read_to_string(&path)
            .map_err(|source| StoreError::Read { path: path.clone(), source })?;
        let leads: Vec<Lead> = serde_json::from_str(&raw)
            .map_err(|source| StoreError::Parse { path: path.clone(), source })?;

        debug!(path = %path.display(), count = leads.len(), "lead store loaded");
        Ok(Self { path, leads })
    }

    /// Rewrites the backing file with the current collection, pretty-printed,
    /// order preserved. Nothing is persisted until this is called.
    pub fn flush(&self) -> Result<(), StoreError> {
        write_pretty(&self.path, &self.leads)?;
        debug!(path = %self.path.display(), count = self.leads.len(), "lead store flushed");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// All leads, newest creation first.
    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn get(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id.as_str() == id)
    }

    pub fn search(&self, query: &str) -> Vec<&Lead> {
        self.leads.iter().filter(|lead| lead.matches_query(query)).collect()
    }

    /// Creates a lead from `draft` and prepends it to the collection. The
    /// identifier is the slugified name, de-duplicated with a `-2`, `-3`, ...
    /// suffix on collision.
    pub fn create(&mut self, draft: LeadDraft) -> Lead {
        let id = self.unique_id(&draft.name);
        let lead = Lead {
            id: LeadId(id),
            name: draft.name.trim().to_string(),
            website: draft.website.trim().to_string(),
            hq: draft.hq.trim().to_string(),
            industry: draft.industry.trim().to_string(),
            founded: draft.founded,
            employees: draft.employees,
            products: draft.products,
            notes: Vec::new(),
            extra: serde_json::Map::new(),
        };
        self.leads.insert(0, lead.clone());
        lead
    }

    /// Applies the allow-listed fields of `patch`; absent fields leave the
    /// lead unchanged. Returns the updated record.
    pub fn update(&mut self, id: &str, patch: LeadPatch) -> Result<Lead, StoreError> {
        let lead = self.get_mut(id)?;

        if let Some(name) = patch.name {
            lead.name = name;
        }
        if let Some(website) = patch.website {
            lead.website = website;
        }
        if let Some(hq) = patch.hq {
            lead.hq = hq;
        }
        if let Some(industry) = patch.industry {
            lead.industry = industry;
        }
        if let Some(founded) = patch.founded {
            lead.founded = Some(founded);
        }
        if let Some(employees) = patch.employees {
            lead.employees = Some(employees);
        }
        if let Some(products) = patch.products {
            lead.products = products;
        }
        if let Some(extra) = patch.extra {
            lead.extra = extra;
        }
        if let Some(notes) = patch.notes {
            lead.notes = notes;
        }

        Ok(lead.clone())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let index = self
            .leads
            .iter()
            .position(|lead| lead.id.as_str() == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.leads.remove(index);
        Ok(())
    }

    /// Trims the text, stamps the current UTC time, and prepends the note so
    /// the list stays newest-first. Returns the updated record.
    pub fn append_note(&mut self, id: &str, text: &str) -> Result<Lead, StoreError> {
        let note = Note { at: Utc::now(), text: text.trim().to_string() };
        let lead = self.get_mut(id)?;
        lead.notes.insert(0, note);
        Ok(lead.clone())
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Lead, StoreError> {
        self.leads
            .iter_mut()
            .find(|lead| lead.id.as_str() == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn unique_id(&self, name: &str) -> String {
        let base = slugify(name);
        if self.get(&base).is_none() {
            return base;
        }

        let mut counter = 2u32;
        loop {
            let candidate = format!("{base}-{counter}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            counter += 1;
        }
    }
}

fn write_pretty(path: &Path, leads: &[Lead]) -> Result<(), StoreError> {
    let body = serde_json::to_string_pretty(leads)
        .map_err(|source| StoreError::Serialize { path: path.to_path_buf(), source })?;
    fs::write(path, body).map_err(|source| StoreError::Write { path: path.to_path_buf(), source })
}
