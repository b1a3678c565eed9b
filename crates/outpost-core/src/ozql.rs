//! OZQL, the console's hunting query box.
//!
//! There is no parser behind it: a query is matched against a table of
//! keyword patterns and the first hit returns a canned result table.

use serde::Serialize;

use crate::error::CoreError;
use outpost_domain::ValidationError;

const DEFAULT_COLUMNS: &[&str] = &["timestamp", "host", "event"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub source: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<&'static str>>,
    pub elapsed: &'static str,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct CannedQuery {
    keywords: &'static [&'static str],
    source: &'static str,
    columns: &'static [&'static str],
    rows: &'static [&'static [&'static str]],
    elapsed: &'static str,
}

const CANNED: &[CannedQuery] = &[
    CannedQuery {
        keywords: &["process"],
        source: "process_events",
        columns: &["timestamp", "host", "process", "command_line", "user"],
        rows: &[
            &[
                "2026-10-17T08:41:09Z",
                "FIN-LAPTOP-07",
                "powershell.exe",
                "powershell -nop -w hidden -enc SQBFAFgA",
                "CORP\\jlee",
            ],
            &[
                "2026-10-17T08:43:51Z",
                "DC-01",
                "rundll32.exe",
                "rundll32.exe comsvcs.dll, MiniDump 624",
                "NT AUTHORITY\\SYSTEM",
            ],
        ],
        elapsed: "142ms",
    },
    CannedQuery {
        keywords: &["network", "connection"],
        source: "network_events",
        columns: &["timestamp", "host", "dest_ip", "dest_port", "bytes_out"],
        rows: &[
            &["2026-10-17T07:12:44Z", "WEB-01", "185.220.101.4", "4444", "18231"],
            &["2026-10-17T07:13:02Z", "WEB-01", "185.220.101.4", "4444", "90412"],
            &["2026-10-17T07:55:19Z", "DB-01", "10.0.1.11", "5432", "2048"],
        ],
        elapsed: "218ms",
    },
    CannedQuery {
        keywords: &["login", "auth"],
        source: "auth_events",
        columns: &["timestamp", "user", "source_ip", "outcome"],
        rows: &[
            &["2026-10-17T03:02:11Z", "admin", "203.0.113.50", "failure"],
            &["2026-10-17T03:02:14Z", "admin", "203.0.113.50", "failure"],
            &["2026-10-17T03:02:19Z", "admin", "203.0.113.50", "success"],
        ],
        elapsed: "97ms",
    },
    CannedQuery {
        keywords: &["file"],
        source: "file_events",
        columns: &["timestamp", "host", "path", "action", "sha256"],
        rows: &[&[
            "2026-10-16T23:10:00Z",
            "FIN-LAPTOP-07",
            "C:\\Users\\jlee\\AppData\\Local\\Temp\\inv_0931.xlsm",
            "created",
            "9f2c…e01a",
        ]],
        elapsed: "176ms",
    },
    CannedQuery {
        keywords: &["dns"],
        source: "dns_events",
        columns: &["timestamp", "host", "query", "answer"],
        rows: &[&[
            "2026-10-17T06:30:30Z",
            "DESIGN-MBP-02",
            "update-check.badcdn.example",
            "198.51.100.23",
        ]],
        elapsed: "64ms",
    },
];

/// Runs `text` against the canned pattern table.
///
/// A blank query is a validation error; a query that hits no pattern yields
/// an empty table with the default columns.
pub fn execute(text: &str) -> Result<QueryResult, CoreError> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(ValidationError::MissingField { field: "query" }.into());
    }

    let hit = CANNED.iter().find(|canned| {
        canned
            .keywords
            .iter()
            .any(|keyword| normalized.contains(keyword))
    });

    Ok(match hit {
        Some(canned) => QueryResult {
            source: canned.source,
            columns: canned.columns.to_vec(),
            rows: canned.rows.iter().map(|row| row.to_vec()).collect(),
            elapsed: canned.elapsed,
        },
        None => QueryResult {
            source: "events",
            columns: DEFAULT_COLUMNS.to_vec(),
            rows: Vec::new(),
            elapsed: "12ms",
        },
    })
}
