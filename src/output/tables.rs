use std::cmp::Ordering;

use clap::{Args, ValueEnum};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use indexmap::IndexMap;

use crate::error::Result;
use crate::providers::gitlab::types::{
    Environment, Group, Project, Variable, ALL_ENVIRONMENTS_SCOPE,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Yaml,
}

/// Table flags shared by every listing.
#[derive(Debug, Clone, Default, Args)]
pub struct TableOptions {
    /// Only show these columns (comma-separated keys or headers)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Show extra columns
    #[arg(short = 'x', long, default_value_t = false)]
    pub extended: bool,

    /// Sort by column; prefix with '-' for descending order
    #[arg(long, allow_hyphen_values = true)]
    pub sort: Option<String>,

    /// Only keep rows whose column contains a value (column=value)
    #[arg(long)]
    pub filter: Option<String>,

    /// Do not wrap or shorten cells to fit the terminal
    #[arg(long, default_value_t = false)]
    pub no_truncate: bool,

    /// Hide the table header
    #[arg(long, default_value_t = false)]
    pub no_header: bool,

    /// Shorthand for --output csv
    #[arg(long, default_value_t = false, conflicts_with = "output")]
    pub csv: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub output: Option<OutputFormat>,
}

impl TableOptions {
    pub fn format(&self) -> OutputFormat {
        if self.csv {
            OutputFormat::Csv
        } else {
            self.output.unwrap_or_default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
    pub extended: bool,
}

impl Column {
    pub const fn new(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            extended: false,
        }
    }

    pub const fn extended(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            extended: true,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name) || self.header.eq_ignore_ascii_case(name)
    }
}

/// A record that can be shown as a table row.
pub trait TableRecord {
    /// Columns available for a list of records.
    fn columns(records: &[Self]) -> Vec<Column>
    where
        Self: Sized;

    fn cell(&self, key: &str) -> String;
}

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub type Row = IndexMap<String, String>;

/// Builds the filtered, sorted rows and the columns to show.
pub fn rows<R: TableRecord>(records: &[R], options: &TableOptions) -> (Vec<Column>, Vec<Row>) {
    let available = R::columns(records);
    let shown = select_columns(&available, options);

    let mut rows: Vec<Row> = records
        .iter()
        .map(|record| {
            available
                .iter()
                .map(|c| (c.key.to_string(), record.cell(c.key)))
                .collect()
        })
        .collect();

    if let Some(filter) = &options.filter {
        apply_filter(&mut rows, &available, filter);
    }
    if let Some(sort) = &options.sort {
        apply_sort(&mut rows, &available, sort);
    }

    let rows = rows
        .into_iter()
        .map(|mut row| {
            shown
                .iter()
                .map(|c| (c.key.to_string(), row.shift_remove(c.key).unwrap_or_default()))
                .collect()
        })
        .collect();

    (shown, rows)
}

/// Renders records according to the table flags.
pub fn render<R: TableRecord>(records: &[R], options: &TableOptions) -> Result<String> {
    let (shown, rows) = rows(records, options);

    Ok(match options.format() {
        OutputFormat::Table => render_table(&shown, &rows, options),
        OutputFormat::Csv => render_csv(&shown, &rows, options),
        OutputFormat::Json => serde_json::to_string_pretty(&rows)? + "\n",
        OutputFormat::Yaml => serde_yaml::to_string(&rows)?,
    })
}

fn select_columns(available: &[Column], options: &TableOptions) -> Vec<Column> {
    if options.columns.is_empty() {
        return available
            .iter()
            .filter(|c| options.extended || !c.extended)
            .copied()
            .collect();
    }

    options
        .columns
        .iter()
        .filter_map(|name| available.iter().find(|c| c.matches(name.trim())))
        .copied()
        .collect()
}

fn find_key<'a>(available: &'a [Column], name: &str) -> Option<&'a str> {
    available.iter().find(|c| c.matches(name)).map(|c| c.key)
}

fn apply_filter(rows: &mut Vec<Row>, available: &[Column], filter: &str) {
    let Some((column, needle)) = filter.split_once('=') else {
        log::warn!("Ignoring filter without '=': {filter}");
        return;
    };
    let Some(key) = find_key(available, column.trim()) else {
        log::warn!("Ignoring filter on unknown column: {column}");
        return;
    };
    let needle = needle.to_lowercase();
    rows.retain(|row| {
        row.get(key)
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    });
}

fn apply_sort(rows: &mut [Row], available: &[Column], sort: &str) {
    let (descending, column) = match sort.strip_prefix('-') {
        Some(column) => (true, column),
        None => (false, sort),
    };
    let Some(key) = find_key(available, column.trim()) else {
        log::warn!("Ignoring sort on unknown column: {column}");
        return;
    };

    rows.sort_by(|a, b| {
        let ordering = compare_cells(
            a.get(key).map_or("", String::as_str),
            b.get(key).map_or("", String::as_str),
        );
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

fn render_table(columns: &[Column], rows: &[Row], options: &TableOptions) -> String {
    let mut table = create_table();
    if options.no_truncate {
        table.set_content_arrangement(ContentArrangement::Disabled);
    }
    if !options.no_header {
        table.set_header(
            columns
                .iter()
                .map(|c| Cell::new(c.header).add_attribute(Attribute::Bold)),
        );
    }
    for row in rows {
        table.add_row(row.values().map(Cell::new));
    }
    format!("{table}\n")
}

fn render_csv(columns: &[Column], rows: &[Row], options: &TableOptions) -> String {
    let mut output = String::new();
    if !options.no_header {
        let header: Vec<String> = columns.iter().map(|c| csv_field(c.header)).collect();
        output.push_str(&header.join(","));
        output.push('\n');
    }
    for row in rows {
        let fields: Vec<String> = row.values().map(|v| csv_field(v)).collect();
        output.push_str(&fields.join(","));
        output.push('\n');
    }
    output
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn yes_no(value: bool) -> String {
    let label = if value { "Yes" } else { "No" };
    label.to_string()
}

fn timestamp(value: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

impl TableRecord for Group {
    fn columns(_: &[Self]) -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("path", "Path"),
            Column::new("web_url", "URL"),
            Column::extended("full_path", "Full path"),
            Column::extended("created_at", "Created"),
        ]
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "path" => self.path.clone(),
            "web_url" => self.web_url.clone(),
            "full_path" => self.full_path.clone(),
            "created_at" => timestamp(self.created_at.as_ref()),
            _ => String::new(),
        }
    }
}

impl TableRecord for Project {
    fn columns(_: &[Self]) -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("path", "Path"),
            Column::new("name", "Name"),
            Column::extended("web_url", "URL"),
            Column::extended("last_activity_at", "Last activity"),
        ]
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "id" => format!("{} | {}", self.id, self.path),
            "path" => self.path.clone(),
            "name" => self.name.clone(),
            "web_url" => self.web_url.clone(),
            "last_activity_at" => timestamp(self.last_activity_at.as_ref()),
            _ => String::new(),
        }
    }
}

impl TableRecord for Environment {
    fn columns(_: &[Self]) -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("state", "State"),
            Column::new("external_url", "URL"),
        ]
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "state" => self.state.to_string(),
            "external_url" => self.external_url.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

impl TableRecord for Variable {
    fn columns(records: &[Self]) -> Vec<Column> {
        let mut columns = Vec::new();
        if records
            .first()
            .is_some_and(|v| v.environment_scope.is_some())
        {
            columns.push(Column::new("environment_scope", "Environment(s)"));
        }
        columns.extend([
            Column::new("key", "Key"),
            Column::new("value", "Value"),
            Column::new("protected", "Protected"),
            Column::new("masked", "Masked"),
            Column::extended("variable_type", "Type"),
        ]);
        columns
    }

    fn cell(&self, key: &str) -> String {
        match key {
            "environment_scope" => match self.environment_scope.as_deref() {
                Some(ALL_ENVIRONMENTS_SCOPE) => "* (All)".to_string(),
                Some(scope) => scope.to_string(),
                None => String::new(),
            },
            "key" => self.key.clone(),
            "value" => self.value.clone(),
            "protected" => yes_no(self.protected),
            "masked" => yes_no(self.masked),
            "variable_type" => self.variable_type.to_string(),
            _ => String::new(),
        }
    }
}
