use std::io::{self, Stdout, Write};

use indexmap::IndexMap;

use super::tables::{self, OutputFormat, Row, TableOptions, TableRecord};
use super::{heading, label, value};
use crate::error::Result;

/// Writes headings, detail lines and tables.
///
/// Headings and detail lines only make sense for people reading a terminal,
/// so they are skipped when a machine format (CSV, JSON, YAML) is requested.
/// JSON and YAML sections are collected and written by [`Presenter::finish`]
/// as one document keyed by section, e.g. `{"projects": [..], "variables": [..]}`.
/// CSV sections are written as they come, separated by a blank line.
pub struct Presenter<W: Write> {
    out: W,
    options: TableOptions,
    sections: IndexMap<String, Vec<Row>>,
    csv_blocks: usize,
}

impl Presenter<Stdout> {
    pub fn stdout(options: TableOptions) -> Self {
        Self::new(io::stdout(), options)
    }
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, options: TableOptions) -> Self {
        Self {
            out,
            options,
            sections: IndexMap::new(),
            csv_blocks: 0,
        }
    }

    fn decorated(&self) -> bool {
        self.options.format() == OutputFormat::Table
    }

    pub fn heading(&mut self, text: impl std::fmt::Display) -> Result<()> {
        if self.decorated() {
            writeln!(self.out, "\n{}\n", heading(text))?;
        }
        Ok(())
    }

    pub fn detail(&mut self, name: &str, text: impl std::fmt::Display) -> Result<()> {
        if self.decorated() {
            writeln!(self.out, "  {} {}", label(format!("{name}:")), value(text))?;
        }
        Ok(())
    }

    /// Prints a status line. Machine formats send it to stderr so stdout
    /// stays parseable.
    pub fn message(&mut self, text: impl std::fmt::Display) -> Result<()> {
        if self.decorated() {
            writeln!(self.out, "{text}")?;
        } else {
            eprintln!("{text}");
        }
        Ok(())
    }

    /// Renders a titled table.
    pub fn table<R: TableRecord>(&mut self, title: &str, records: &[R]) -> Result<()> {
        match self.options.format() {
            OutputFormat::Table => {
                let rendered = tables::render(records, &self.options)?;
                self.heading(title)?;
                self.out.write_all(rendered.as_bytes())?;
                writeln!(self.out, "  {} {}", label("Total:"), records.len())?;
            }
            OutputFormat::Csv => {
                if self.csv_blocks > 0 {
                    writeln!(self.out)?;
                }
                let rendered = tables::render(records, &self.options)?;
                self.out.write_all(rendered.as_bytes())?;
                self.csv_blocks += 1;
            }
            OutputFormat::Json | OutputFormat::Yaml => {
                let (_, rows) = tables::rows(records, &self.options);
                self.sections.insert(section_key(title), rows);
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Writes any collected JSON/YAML document and hands back the writer.
    pub fn finish(mut self) -> Result<W> {
        if !self.sections.is_empty() {
            match self.options.format() {
                OutputFormat::Yaml => {
                    let document = serde_yaml::to_string(&self.sections)?;
                    self.out.write_all(document.as_bytes())?;
                }
                _ => {
                    serde_json::to_writer_pretty(&mut self.out, &self.sections)?;
                    writeln!(self.out)?;
                }
            }
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

fn section_key(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::gitlab::types::{Environment, EnvironmentState};

    fn environments() -> Vec<Environment> {
        vec![Environment {
            id: 1,
            name: "production".into(),
            state: EnvironmentState::Available,
            external_url: Some("https://app.example.com".into()),
        }]
    }

    fn render_with(options: TableOptions) -> String {
        let mut presenter = Presenter::new(Vec::new(), options);
        presenter.heading("Project").unwrap();
        presenter.detail("ID", 72).unwrap();
        presenter.table("Environments", &environments()).unwrap();
        presenter.table("Review Apps", &environments()).unwrap();
        String::from_utf8(presenter.finish().unwrap()).unwrap()
    }

    fn with_format(format: OutputFormat) -> TableOptions {
        TableOptions {
            output: Some(format),
            ..TableOptions::default()
        }
    }

    #[test]
    fn test_table_mode_prints_headings_and_total() {
        let output = render_with(TableOptions::default());
        assert!(output.contains("Project"));
        assert!(output.contains("Environments"));
        assert!(output.contains("https://app.example.com"));
        assert!(output.contains("Total:"));
    }

    #[test]
    fn test_json_is_one_document_keyed_by_section() {
        let output = render_with(with_format(OutputFormat::Json));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["environments"][0]["name"], "production");
        assert_eq!(parsed["review_apps"][0]["id"], "1");
        assert!(!output.contains("Project"));
    }

    #[test]
    fn test_yaml_is_one_document_keyed_by_section() {
        let output = render_with(with_format(OutputFormat::Yaml));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed["environments"][0]["name"].as_str(), Some("production"));
        assert!(parsed.get("review_apps").is_some());
    }

    #[test]
    fn test_csv_sections_are_separated_by_a_blank_line() {
        let output = render_with(with_format(OutputFormat::Csv));
        let blocks: Vec<&str> = output.trim_end().split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|block| block.starts_with("ID,Name")));
    }

    #[test]
    fn test_nothing_collected_writes_nothing() {
        let presenter = Presenter::new(Vec::new(), with_format(OutputFormat::Json));
        assert!(presenter.finish().unwrap().is_empty());
    }
}
