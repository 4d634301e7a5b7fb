use anyhow::Context;

use crate::db::{KeyValueStore, JOBS_KEY, THEME_KEY};
use crate::error::{StoreError, ValidationError};
use crate::models::{JobRecord, StatusFilter};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Added(usize),
    Updated(usize),
}

/// A record in a filtered view, tagged with its position in the full list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listed<'a> {
    pub index: usize,
    pub job: &'a JobRecord,
}

/// Owns the job list and all transient UI state. Every mutation writes a
/// full snapshot of the list back to storage before returning.
pub struct JobStore<S: KeyValueStore> {
    storage: S,
    jobs: Vec<JobRecord>,
    editing: Option<usize>,
    form: JobRecord,
    filter: StatusFilter,
    search: String,
    theme: Theme,
}

impl<S: KeyValueStore> JobStore<S> {
    pub fn load(storage: S, prefers_dark: bool) -> Result<Self, StoreError> {
        let jobs = match storage.get(JOBS_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<JobRecord>>(&raw) {
                Ok(jobs) => jobs,
                Err(e) => {
                    log::warn!("Stored job list is unreadable ({}), starting empty", e);
                    Vec::new()
                }
            },
        };
        let theme = Theme::resolve(storage.get(THEME_KEY)?.as_deref(), prefers_dark);
        log::debug!("Loaded {} jobs, theme {}", jobs.len(), theme.as_token());

        Ok(Self {
            storage,
            jobs,
            editing: None,
            form: JobRecord::default(),
            filter: StatusFilter::All,
            search: String::new(),
            theme,
        })
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs().len()
    }

    pub fn get(&self, index: usize) -> Option<&JobRecord> {
        self.jobs.get(index)
    }

    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    pub fn form(&self) -> &JobRecord {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut JobRecord {
        &mut self.form
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter.clone()
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Append, or replace the record under edit. The form is reset on success
    /// and left untouched when validation fails.
    pub fn save(&mut self, record: JobRecord) -> Result<SaveOutcome, StoreError> {
        if is_blank(&record.company) || is_blank(&record.role) {
            return Err(ValidationError::MissingCompanyOrRole.into());
        }

        // Nothing changes in memory unless the write succeeds.
        let mut jobs = self.jobs.clone();
        let outcome = match self.editing {
            Some(i) if i < jobs.len() => {
                jobs[i] = record;
                SaveOutcome::Updated(i)
            }
            stale => {
                if let Some(i) = stale {
                    log::warn!("Edit target #{} no longer exists, appending instead", i);
                }
                jobs.push(record);
                SaveOutcome::Added(jobs.len() - 1)
            }
        };
        self.persist(&jobs)?;
        self.jobs = jobs;
        self.editing = None;
        self.form = JobRecord::default();
        log::info!("Saved job: {:?}", outcome);
        Ok(outcome)
    }

    /// Save whatever is in the form buffer.
    pub fn submit(&mut self) -> Result<SaveOutcome, StoreError> {
        self.save(self.form.clone())
    }

    pub fn start_edit(&mut self, index: usize) -> Result<(), StoreError> {
        let job = self.jobs.get(index).ok_or(StoreError::NoSuchJob {
            index,
            len: self.jobs.len(),
        })?;
        self.form = job.clone();
        self.editing = Some(index);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.form = JobRecord::default();
    }

    pub fn delete(&mut self, index: usize) -> Result<JobRecord, StoreError> {
        if index >= self.jobs.len() {
            return Err(StoreError::NoSuchJob {
                index,
                len: self.jobs.len(),
            });
        }
        let mut jobs = self.jobs.clone();
        let removed = jobs.remove(index);
        self.persist(&jobs)?;
        self.jobs = jobs;
        self.editing = match self.editing {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        log::info!("Deleted job #{} ({})", index, removed.company);
        Ok(removed)
    }

    /// Filtered view in original order. Search is a case-insensitive substring
    /// match over company, role, location and notes.
    pub fn query(&self, filter: StatusFilter, search: &str) -> Vec<Listed<'_>> {
        let needle = search.to_lowercase();
        self.jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| filter.matches(&job.status))
            .filter(|(_, job)| needle.is_empty() || matches_search(job, &needle))
            .map(|(index, job)| Listed { index, job })
            .collect()
    }

    pub fn visible(&self) -> Vec<Listed<'_>> {
        self.query(self.filter.clone(), &self.search)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        let next = self.theme.toggled();
        self.storage
            .set(THEME_KEY, next.as_token())
            .context("Failed to save theme")?;
        self.theme = next;
        Ok(next)
    }

    fn persist(&self, jobs: &[JobRecord]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(jobs).context("Failed to encode jobs")?;
        self.storage.set(JOBS_KEY, &encoded)?;
        Ok(())
    }
}

// Same character set as JavaScript's trim, which also strips U+FEFF.
fn is_blank(s: &str) -> bool {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .is_empty()
}

fn matches_search(job: &JobRecord, needle: &str) -> bool {
    [&job.company, &job.role, &job.location, &job.notes]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
