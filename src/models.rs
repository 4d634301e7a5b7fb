use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
    /// A stored token that is not one of the four above. Kept verbatim so it
    /// round-trips; it only ever matches the `All` filter.
    Other(String),
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Applied,
        Status::Interview,
        Status::Offer,
        Status::Rejected,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Status::Applied => "Applied",
            Status::Interview => "Interview",
            Status::Offer => "Offer",
            Status::Rejected => "Rejected",
            Status::Other(raw) => raw,
        }
    }

    /// Exact match on the stored token; anything else becomes `Other`.
    pub fn from_token(token: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == token)
            .unwrap_or_else(|| Status::Other(token.to_string()))
    }

    pub fn next(&self) -> Self {
        match Self::ALL.iter().position(|s| s == self) {
            Some(i) => Self::ALL[(i + 1) % Self::ALL.len()].clone(),
            None => Status::Applied,
        }
    }

    pub fn prev(&self) -> Self {
        match Self::ALL.iter().position(|s| s == self) {
            Some(i) => Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()].clone(),
            None => Status::Applied,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive, for command-line input. Stored data goes through
/// `from_token` instead.
impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown status '{}' (applied, interview, offer, rejected)", s))
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Stored data may have been edited by hand; a bad status must not poison the
// whole collection.
impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(token) => {
                let status = Status::from_token(&token);
                if let Status::Other(raw) = &status {
                    log::warn!("Unknown stored status '{}', kept as-is", raw);
                }
                status
            }
            serde_json::Value::Null => Status::default(),
            other => {
                log::warn!("Non-text stored status {}, treating as Applied", other);
                Status::default()
            }
        })
    }
}

/// One tracked application. Records have no id; they are addressed by position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub salary: String, // free text, only interpreted for display
    #[serde(deserialize_with = "lenient_string")]
    pub date: String, // YYYY-MM-DD or empty
    pub status: Status,
    #[serde(deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: String,
}

impl JobRecord {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Accepts `null` and bare numbers where a string is expected.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub const CHOICES: [StatusFilter; 5] = [
        StatusFilter::All,
        StatusFilter::Only(Status::Applied),
        StatusFilter::Only(Status::Interview),
        StatusFilter::Only(Status::Offer),
        StatusFilter::Only(Status::Rejected),
    ];

    pub fn matches(&self, status: &Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }

    pub fn next(&self) -> Self {
        let i = Self::CHOICES.iter().position(|f| f == self).unwrap_or(0);
        Self::CHOICES[(i + 1) % Self::CHOICES.len()].clone()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(status) => fmt::Display::fmt(status, f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("interview".parse::<Status>().unwrap(), Status::Interview);
        assert_eq!(" OFFER ".parse::<Status>().unwrap(), Status::Offer);
        assert!("ghosted".parse::<Status>().is_err());
    }

    #[test]
    fn status_cycles_both_ways() {
        assert_eq!(Status::Applied.next(), Status::Interview);
        assert_eq!(Status::Rejected.next(), Status::Applied);
        assert_eq!(Status::Applied.prev(), Status::Rejected);
    }

    #[test]
    fn filter_parses_all_and_statuses() {
        assert_eq!("All".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "offer".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(Status::Offer)
        );
        assert_eq!(StatusFilter::Only(Status::Rejected).next(), StatusFilter::All);
    }

    #[test]
    fn record_serializes_with_plain_keys() {
        let job = JobRecord::new("Acme", "Engineer").with_status(Status::Offer);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["company"], "Acme");
        assert_eq!(json["status"], "Offer");
        assert_eq!(json["notes"], "");
    }

    #[test]
    fn tampered_record_still_loads() {
        let json = r#"{"company": null, "salary": 65000, "status": "Ghosted"}"#;
        let job: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(job.company, "");
        assert_eq!(job.role, "");
        assert_eq!(job.salary, "65000");
        assert_eq!(job.status, Status::Other("Ghosted".into()));
    }

    #[test]
    fn stored_status_is_matched_exactly() {
        let job: JobRecord = serde_json::from_str(r#"{"status": "offer"}"#).unwrap();
        assert_eq!(job.status, Status::Other("offer".into()));
        assert!(!StatusFilter::Only(Status::Offer).matches(&job.status));
        assert!(!StatusFilter::Only(Status::Applied).matches(&job.status));
        assert!(StatusFilter::All.matches(&job.status));
        assert_eq!(serde_json::to_value(&job).unwrap()["status"], "offer");
    }

    #[test]
    fn non_text_status_becomes_applied() {
        let jobs: Vec<JobRecord> = serde_json::from_str(
            r#"[{"company": "Keep", "status": "Offer"}, {"company": "Bad", "status": 2},
                {"company": "Odd", "status": {"x": 1}}, {"company": "Nil", "status": null}]"#,
        )
        .unwrap();
        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs[0].status, Status::Offer);
        assert_eq!(jobs[1].status, Status::Applied);
        assert_eq!(jobs[2].status, Status::Applied);
        assert_eq!(jobs[3].status, Status::Applied);
    }

    #[test]
    fn unknown_status_cycles_back_to_applied() {
        assert_eq!(Status::Other("Ghosted".into()).next(), Status::Applied);
        assert_eq!(Status::Other("Ghosted".into()).prev(), Status::Applied);
    }
}
