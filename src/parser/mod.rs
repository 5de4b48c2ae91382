pub mod schedule;

use std::fmt;

use tracing::debug;

use crate::config::AgencyConfig;
use crate::error::ScrapeError;
use crate::meeting::Meeting;
use crate::pdf;

/// Which of the three start URLs a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    FutureSchedule,
    BoardDocumentsThisYear,
    BoardDocumentsLastYear,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FutureSchedule => "future schedule",
            Self::BoardDocumentsThisYear => "board documents (this year)",
            Self::BoardDocumentsLastYear => "board documents (last year)",
        })
    }
}

/// Route a fetched document to the handler for its kind.
pub fn parse_document(
    config: &AgencyConfig,
    kind: DocumentKind,
    body: &[u8],
    url: &str,
) -> Result<Vec<Meeting>, ScrapeError> {
    match kind {
        DocumentKind::FutureSchedule => parse_future_board_meetings(config, body, url),
        DocumentKind::BoardDocumentsThisYear | DocumentKind::BoardDocumentsLastYear => {
            Err(ScrapeError::Unsupported(kind))
        }
    }
}

/// PDF with the upcoming schedule: dates plus a shared start time on page one.
pub fn parse_future_board_meetings(
    config: &AgencyConfig,
    body: &[u8],
    url: &str,
) -> Result<Vec<Meeting>, ScrapeError> {
    let text = pdf::first_page_text(body)?;
    debug!("First page of {}:\n{}", url, text);
    Ok(schedule::build_records(config, &text, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_pages_are_unsupported() {
        let cfg = AgencyConfig::default();
        for kind in [
            DocumentKind::BoardDocumentsThisYear,
            DocumentKind::BoardDocumentsLastYear,
        ] {
            let err = parse_document(&cfg, kind, b"<html></html>", "https://x").unwrap_err();
            assert!(matches!(err, ScrapeError::Unsupported(k) if k == kind));
        }
    }

    #[test]
    fn schedule_requires_a_pdf() {
        let cfg = AgencyConfig::default();
        let err = parse_document(&cfg, DocumentKind::FutureSchedule, b"<html>", "https://x")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Pdf(_)));
    }

    #[test]
    fn schedule_pdf_yields_meetings_from_page_one() {
        let cfg = AgencyConfig::default();
        let body = pdf::sample_pdf(&[
            "Board meets at 10:00 AM on July 9, 2024",
            "August 13, 2024",
        ]);
        let url = "https://www.il-fa.com/sites/default/files/homepage_pdf/fy_2025_meeting_schedule.pdf";
        let meetings = parse_document(&cfg, DocumentKind::FutureSchedule, &body, url).unwrap();
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].start.to_string(), "2024-07-09 10:00:00");
        assert_eq!(meetings[0].source, url);
    }

    #[test]
    fn unsupported_message_names_the_kind() {
        let err = ScrapeError::Unsupported(DocumentKind::BoardDocumentsLastYear);
        assert_eq!(
            err.to_string(),
            "no handler for board documents (last year) yet"
        );
    }
}
