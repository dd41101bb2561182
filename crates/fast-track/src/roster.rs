//! CSV roster import used to seed a leaderboard population.
//!
//! Expected headers: `id,name,associate_id,start_date,on_time_completed,on_time_total,
//! quality_scores,completed_sprints,status,rank,previous_rank,graduation_date`. List cells
//! are `;`-separated; the trailing optional columns may be blank or absent.

use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::leaderboard::{
    AssociateId, ClientId, ClientProgress, ClientStatus, FINAL_SPRINT, FIRST_SPRINT,
    MAX_QUALITY_SCORE,
};

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, reason: String },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::InvalidRow { line, reason } => {
                write!(f, "roster line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ClientProgress>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ClientProgress>, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut seen: HashSet<String> = HashSet::new();
        let mut clients = Vec::new();

        for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
            // header is line 1
            let line = index + 2;
            let row = record?;
            if !seen.insert(row.id.clone()) {
                return Err(invalid(line, format!("duplicate client id '{}'", row.id)));
            }
            clients.push(row.into_client().map_err(|reason| invalid(line, reason))?);
        }

        Ok(clients)
    }
}

fn invalid(line: usize, reason: String) -> RosterImportError {
    RosterImportError::InvalidRow { line, reason }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    name: String,
    associate_id: String,
    start_date: String,
    #[serde(default)]
    on_time_completed: u32,
    #[serde(default)]
    on_time_total: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    quality_scores: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    completed_sprints: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    rank: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    previous_rank: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    graduation_date: Option<String>,
}

impl RosterRow {
    fn into_client(self) -> Result<ClientProgress, String> {
        if self.id.is_empty() {
            return Err("client id is required".to_string());
        }
        if self.on_time_completed > self.on_time_total {
            return Err(format!(
                "on_time_completed {} exceeds on_time_total {}",
                self.on_time_completed, self.on_time_total
            ));
        }

        let quality_scores = parse_list(self.quality_scores.as_deref(), "quality score")?;
        if let Some(score) = quality_scores.iter().find(|score| **score > MAX_QUALITY_SCORE) {
            return Err(format!("quality score {score} is above {MAX_QUALITY_SCORE}"));
        }

        let sprints = parse_list(self.completed_sprints.as_deref(), "sprint number")?;
        let mut completed_sprints = BTreeSet::new();
        for sprint in sprints {
            if !(FIRST_SPRINT..=FINAL_SPRINT).contains(&sprint) {
                return Err(format!(
                    "sprint {sprint} is outside {FIRST_SPRINT}..={FINAL_SPRINT}"
                ));
            }
            if !completed_sprints.insert(sprint) {
                return Err(format!("sprint {sprint} is listed twice"));
            }
        }
        if quality_scores.len() != completed_sprints.len() {
            return Err(format!(
                "{} quality scores for {} completed sprints",
                quality_scores.len(),
                completed_sprints.len()
            ));
        }

        let declared = match self.status.as_deref() {
            Some(raw) => {
                Some(ClientStatus::parse(raw).ok_or_else(|| format!("unknown status '{raw}'"))?)
            }
            None => None,
        };
        let graduated = completed_sprints.contains(&FINAL_SPRINT);
        let status = match (declared, graduated) {
            (_, true) => ClientStatus::Graduated,
            (Some(ClientStatus::Graduated), false) => {
                return Err(format!("GRADUATED without sprint {FINAL_SPRINT}"));
            }
            (Some(status), false) => status,
            (None, false) if completed_sprints.is_empty() => ClientStatus::StartingSoon,
            (None, false) => ClientStatus::OnTime,
        };

        let start_date = parse_date(&self.start_date)?;
        let graduation_date = self.graduation_date.as_deref().map(parse_date).transpose()?;

        Ok(ClientProgress {
            id: ClientId(self.id),
            name: self.name,
            associate_id: AssociateId(self.associate_id),
            start_date,
            on_time_completed: self.on_time_completed,
            on_time_total: self.on_time_total,
            quality_scores,
            completed_sprints,
            status,
            rank: parse_rank(self.rank.as_deref())?,
            previous_rank: parse_rank(self.previous_rank.as_deref())?,
            graduation_date,
        })
    }
}

fn parse_list(raw: Option<&str>, what: &str) -> Result<Vec<u8>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<u8>()
                .map_err(|_| format!("invalid {what} '{item}'"))
        })
        .collect()
}

fn parse_rank(raw: Option<&str>) -> Result<Option<u32>, String> {
    match raw {
        None => Ok(None),
        Some(value) => match value.parse::<u32>() {
            Ok(rank) if rank >= 1 => Ok(Some(rank)),
            _ => Err(format!("rank '{value}' must be a positive integer")),
        },
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,name,associate_id,start_date,on_time_completed,on_time_total,quality_scores,completed_sprints,status,rank\n";

    #[test]
    fn imports_rows_with_lists_and_defaults() {
        let csv = format!(
            "{HEADER}acme,Acme Corp,guru-1,2025-01-06,2,3,80;85;90,1;2;3,ON_TIME,1\n\
nova,Nova Labs,guru-2,2025-02-03,0,0,,,,\n"
        );
        let clients = RosterImporter::from_reader(csv.as_bytes()).expect("roster imports");
        assert_eq!(clients.len(), 2);

        let acme = &clients[0];
        assert_eq!(acme.quality_scores, vec![80, 85, 90]);
        assert_eq!(acme.completed_sprints.len(), 3);
        assert_eq!(acme.rank, Some(1));
        assert_eq!(acme.status, ClientStatus::OnTime);

        let nova = &clients[1];
        assert_eq!(nova.status, ClientStatus::StartingSoon);
        assert!(nova.rank.is_none());
        assert!(nova.quality_scores.is_empty());
    }

    #[test]
    fn sprint_thirty_marks_graduation() {
        let csv = format!("{HEADER}orbit,Orbit,guru-1,2024-01-08,1,2,70;75,29;30,ON_TIME,\n");
        let clients = RosterImporter::from_reader(csv.as_bytes()).expect("roster imports");
        assert_eq!(clients[0].status, ClientStatus::Graduated);
    }

    #[test]
    fn rejects_duplicate_sprints_with_line_number() {
        let csv = format!("{HEADER}acme,Acme,guru-1,2025-01-06,1,2,80;85,2;2,,\n");
        match RosterImporter::from_reader(csv.as_bytes()) {
            Err(RosterImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("listed twice"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn rejects_impossible_on_time_counters() {
        let csv = format!("{HEADER}acme,Acme,guru-1,2025-01-06,3,2,80;85,1;2,,\n");
        let err = RosterImporter::from_reader(csv.as_bytes()).expect_err("row is invalid");
        assert!(err.to_string().contains("exceeds on_time_total"));
    }

    #[test]
    fn rejects_duplicate_client_ids() {
        let csv = format!(
            "{HEADER}acme,Acme,guru-1,2025-01-06,0,0,,,,\nacme,Acme Again,guru-2,2025-01-06,0,0,,,,\n"
        );
        match RosterImporter::from_reader(csv.as_bytes()) {
            Err(RosterImportError::InvalidRow { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }
}
