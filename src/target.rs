use serde::Serialize;
use std::fmt;

use crate::domain_utils;

/// The single site a run is pointed at. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    company_name: String,
    url: String,
}

impl Target {
    /// Build a target from user input, normalizing the URL and deriving the
    /// company name from its host when none is supplied.
    pub fn new(url: &str, company_name: Option<&str>) -> Self {
        let url = domain_utils::ensure_scheme(url);
        let company_name = match company_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => domain_utils::host_component(&url),
        };
        Self { company_name, url }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.company_name, self.url)
    }
}
