use chrono::NaiveTime;

use crate::meeting::{Link, Location};
use crate::parser::DocumentKind;

const SITE: &str = "https://www.il-fa.com";

/// How the scanners treat a regex match that fails the strict parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedMatch {
    /// End the sequence at the first bad match.
    #[default]
    Stop,
    /// Drop the bad match and keep scanning.
    Skip,
}

/// Static agency metadata stamped onto every meeting.
#[derive(Debug, Clone)]
pub struct AgencyConfig {
    pub name: &'static str,
    pub agency: &'static str,
    pub timezone: &'static str,
    pub office_name: &'static str,
    pub office_address: &'static str,
    pub homepage: &'static str,
    pub homepage_title: &'static str,
    pub meeting_title: &'static str,
    pub default_start_time: NaiveTime,
    pub malformed: MalformedMatch,
}

impl Default for AgencyConfig {
    fn default() -> Self {
        Self {
            name: "il_finance_authority",
            agency: "Illinois Finance Authority",
            timezone: "America/Chicago",
            office_name: "Michael A. Bilandic Building",
            office_address: "160 North LaSalle Street, Suite S-1000, Chicago, Illinois 60601",
            homepage: SITE,
            homepage_title: "IFA Homepage",
            meeting_title: "Board Meeting",
            default_start_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            malformed: MalformedMatch::Stop,
        }
    }
}

impl AgencyConfig {
    pub fn location(&self) -> Location {
        Location {
            name: self.office_name.to_string(),
            address: self.office_address.to_string(),
        }
    }

    pub fn homepage_link(&self) -> Link {
        Link {
            href: self.homepage.to_string(),
            title: self.homepage_title.to_string(),
        }
    }
}

/// The three documents requested for a given year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    pub future_meetings_pdf: String,
    pub board_documents_this_year: String,
    pub board_documents_last_year: String,
}

impl SourceUrls {
    /// The schedule PDF is published for the next fiscal year.
    pub fn for_year(year: i32) -> Self {
        Self {
            future_meetings_pdf: format!(
                "{}/sites/default/files/homepage_pdf/fy_{}_meeting_schedule.pdf",
                SITE,
                year + 1
            ),
            board_documents_this_year: format!("{}/public-access/board-documents/{}", SITE, year),
            board_documents_last_year: format!(
                "{}/public-access/board-documents/{}",
                SITE,
                year - 1
            ),
        }
    }

    /// Start URLs in request order.
    pub fn all(&self) -> Vec<String> {
        vec![
            self.future_meetings_pdf.clone(),
            self.board_documents_this_year.clone(),
            self.board_documents_last_year.clone(),
        ]
    }

    pub fn classify(&self, url: &str) -> Option<DocumentKind> {
        if url == self.future_meetings_pdf {
            Some(DocumentKind::FutureSchedule)
        } else if url == self.board_documents_this_year {
            Some(DocumentKind::BoardDocumentsThisYear)
        } else if url == self.board_documents_last_year {
            Some(DocumentKind::BoardDocumentsLastYear)
        } else {
            None
        }
    }
}
