use std::{
    path::Path,
    str::FromStr,
};

use chrono::{
    DateTime,
    Local,
};
use tokio::io::{
    AsyncWrite,
    AsyncWriteExt,
};

use message::{
    measurement::{
        COLUMNS,
        UNITS,
    },
    Measurement,
};

use crate::{
    smoother::Averaged,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown output format '{other}', expected csv or json")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
enum Kind {
    Sample,
    Average,
}

#[derive(serde::Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    kind:      Kind,
    #[serde(flatten)]
    values:    &'a Measurement,
}

/// Column header block written at the top of an output file.
pub fn header(date: DateTime<Local>, comment: &str) -> String {
    let mut out = format!("\n* * * *\n\n{}", date.format("%Y/%-m/%-d"));

    if !comment.is_empty() {
        out.push('\n');
        out.push_str(comment);
    }

    out.push_str("\n\n* * * *\n\n");
    out.push_str("Date,Time,Mass,,,,Number\n");
    out.push_str(&format!("yyyy/m/d,h:m:s,{}\n", COLUMNS.join(",")));
    out.push_str(&format!(",,{}\n", UNITS.join(",")));

    out
}

pub fn format_sample(format: Format, at: DateTime<Local>, m: &Measurement) -> Result<String> {
    let line = match format {
        Format::Csv => format!("{} - {m}", at.format("%Y/%-m/%-d,%-H:%-M:%-S")),
        Format::Json => serde_json::to_string(&JsonRecord {
            timestamp: at.to_rfc3339(),
            kind:      Kind::Sample,
            values:    m,
        })?,
    };

    Ok(line)
}

pub fn format_average(format: Format, at: DateTime<Local>, avg: &Averaged) -> Result<String> {
    let line = match format {
        Format::Csv => format!("               AVG - {avg}"),
        Format::Json => serde_json::to_string(&JsonRecord {
            timestamp: at.to_rfc3339(),
            kind:      Kind::Average,
            values:    avg.as_ref(),
        })?,
    };

    Ok(line)
}

/// Writes decoded records to the console and, optionally, appends samples to a file.
/// Averages only go to the console.
pub struct Output<W> {
    format:  Format,
    console: W,
    file:    Option<tokio::fs::File>,
}

impl<W> Output<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(format: Format, console: W) -> Self {
        Self {
            format,
            console,
            file: None,
        }
    }

    /// Append to `path`, writing the header block first.
    pub async fn open(
        format: Format,
        console: W,
        path: Option<&Path>,
        comment: &str,
    ) -> Result<Self> {
        let mut result = Self::new(format, console);
        let header = header(Local::now(), comment);

        if format == Format::Csv {
            result.console.write_all(header.as_bytes()).await?;
        }

        if let Some(path) = path {
            let mut file =
                tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;

            file.write_all(header.as_bytes()).await?;
            file.flush().await?;

            tracing::info!(path = %path.display(), "appending measurements to file");
            result.file = Some(file);
        }

        Ok(result)
    }

    pub async fn sample(&mut self, m: &Measurement) -> Result<()> {
        let line = format_sample(self.format, Local::now(), m)? + "\n";

        if let Some(file) = self.file.as_mut() {
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }

        self.write_console(&line).await
    }

    pub async fn average(&mut self, avg: &Averaged) -> Result<()> {
        let line = format_average(self.format, Local::now(), avg)? + "\n";

        self.write_console(&line).await
    }

    async fn write_console(&mut self, line: &str) -> Result<()> {
        self.console.write_all(line.as_bytes()).await?;
        self.console.flush().await?;

        Ok(())
    }

    pub fn into_console(self) -> W {
        self.console
    }
}
