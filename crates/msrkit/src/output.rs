use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msrkit_codec::DecodedTrack;
use serde::Serialize;

use crate::exit::{CliError, CliResult, USAGE};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of a command that only acknowledges.
#[derive(Serialize)]
pub struct AckOutput<'a> {
    pub command: &'a str,
    pub status: &'a str,
}

/// One track of a read or decode.
#[derive(Serialize)]
pub struct TrackOutput {
    pub track: u8,
    pub text: String,
    /// Absent for ISO reads, which carry no parity information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parity_ok: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parity_errors: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lrc_ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_hex: Option<String>,
}

impl TrackOutput {
    pub fn decoded(track: u8, decoded: &DecodedTrack, raw: Option<&[u8]>) -> Self {
        Self {
            track,
            text: decoded.text(),
            parity_ok: Some(decoded.parity_valid()),
            parity_errors: decoded
                .parity_ok
                .iter()
                .enumerate()
                .filter(|(_, ok)| !**ok)
                .map(|(i, _)| i)
                .collect(),
            lrc_ok: Some(decoded.lrc_ok),
            raw_hex: raw.map(to_hex),
        }
    }

    pub fn text(track: u8, data: &[u8]) -> Self {
        Self {
            track,
            text: String::from_utf8_lossy(data).into_owned(),
            parity_ok: None,
            parity_errors: Vec::new(),
            lrc_ok: None,
            raw_hex: None,
        }
    }
}

/// Ask for a card swipe. Only shown when stderr is a terminal.
pub fn prompt_swipe(action: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("swipe card to {action}...");
    }
}

pub fn print_ack(command: &str, format: OutputFormat) {
    let out = AckOutput {
        command,
        status: "ok",
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => println!("{command}: ok"),
        OutputFormat::Raw => {}
    }
}

/// Print a flat record as JSON, a two-column table or `key=value` lines.
/// Raw output prints values only.
pub fn print_record<T: Serialize>(record: &T, fields: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in fields {
                table.add_row(vec![name.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (name, value) in fields {
                println!("{name}={value}");
            }
        }
        OutputFormat::Raw => {
            for (_, value) in fields {
                println!("{value}");
            }
        }
    }
}

pub fn print_tracks(tracks: &[TrackOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&tracks),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TRACK", "TEXT", "PARITY", "LRC"]);
            for t in tracks {
                table.add_row(vec![
                    t.track.to_string(),
                    t.text.clone(),
                    check_mark(t.parity_ok),
                    check_mark(t.lrc_ok),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for t in tracks {
                println!(
                    "track={} parity={} lrc={} text={}",
                    t.track,
                    check_mark(t.parity_ok),
                    check_mark(t.lrc_ok),
                    t.text
                );
            }
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            for t in tracks {
                let _ = writeln!(out, "{}", t.text);
            }
            let _ = out.flush();
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn check_mark(value: Option<bool>) -> String {
    match value {
        Some(true) => "ok".to_string(),
        Some(false) => "FAIL".to_string(),
        None => "-".to_string(),
    }
}

pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Parse hex, ignoring whitespace and `:` separators.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits).map_err(|e| CliError::new(USAGE, format!("invalid hex input: {e}")))
}
