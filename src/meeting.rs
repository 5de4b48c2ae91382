use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    #[serde(rename = "Advisory Committee")]
    AdvisoryCommittee,
    #[serde(rename = "Board")]
    Board,
    #[serde(rename = "City Council")]
    CityCouncil,
    #[serde(rename = "Commission")]
    Commission,
    #[serde(rename = "Committee")]
    Committee,
    #[serde(rename = "Forum")]
    Forum,
    #[serde(rename = "Police Beat")]
    PoliceBeat,
    #[serde(rename = "Not Classified")]
    NotClassified,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown classification: {0}")]
pub struct UnknownClassification(String);

impl Classification {
    pub const ALL: [Classification; 8] = [
        Self::AdvisoryCommittee,
        Self::Board,
        Self::CityCouncil,
        Self::Commission,
        Self::Committee,
        Self::Forum,
        Self::PoliceBeat,
        Self::NotClassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdvisoryCommittee => "Advisory Committee",
            Self::Board => "Board",
            Self::CityCouncil => "City Council",
            Self::Commission => "Commission",
            Self::Committee => "Committee",
            Self::Forum => "Forum",
            Self::PoliceBeat => "Police Beat",
            Self::NotClassified => "Not Classified",
        }
    }
}

impl FromStr for Classification {
    type Err = UnknownClassification;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownClassification(s.to_string()))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub title: String,
}

/// One scheduled meeting, as handed to the output pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meeting {
    pub title: String,
    pub description: String,
    pub classification: Classification,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
    pub time_notes: String,
    pub location: Location,
    pub links: Vec<Link>,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn serializes_pipeline_shape() {
        let m = Meeting {
            title: "Board Meeting".into(),
            description: String::new(),
            classification: Classification::Board,
            start: NaiveDate::from_ymd_opt(2024, 3, 14)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            end: None,
            all_day: false,
            time_notes: String::new(),
            location: Location {
                name: "Office".into(),
                address: "1 Main St".into(),
            },
            links: vec![Link {
                href: "https://example.com".into(),
                title: "Home".into(),
            }],
            source: "https://example.com/a.pdf".into(),
        };

        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["classification"], "Board");
        assert_eq!(v["start"], "2024-03-14T09:30:00");
        assert!(v["end"].is_null());
        assert_eq!(v["location"]["name"], "Office");
        assert_eq!(v["links"][0]["href"], "https://example.com");
    }

    #[test]
    fn classification_names_parse_back() {
        for c in Classification::ALL {
            assert_eq!(c.to_string().parse::<Classification>().unwrap(), c);
            assert_eq!(serde_json::to_value(c).unwrap(), c.as_str());
        }
        assert!("Board Meeting".parse::<Classification>().is_err());
    }

    #[test]
    fn classification_display() {
        assert_eq!(Classification::Board.to_string(), "Board");
        assert_eq!(Classification::NotClassified.to_string(), "Not Classified");
    }
}
