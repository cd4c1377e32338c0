//! Spreadsheet parsing for the process import
//!
//! Accepts the CSV exports the team keeps in spreadsheets: `;` or `,`
//! separated, Portuguese or English headers, Brazilian or ISO dates.
//! File-level problems abort the import; row-level problems are returned
//! per row so the rest of the file can still be imported.

use chrono::NaiveDate;

use crate::app::validation::{self, MAX_LOOKUP_NAME_LEN, MAX_NAME_LEN};
use crate::domain::entities::{normalize_process_number, validate_dates, ImportRow, ImportRowError};
use crate::error::CsvError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Number,
    Complainant,
    Controller,
    Responsible,
    EntryChannel,
    Situation,
    Referral,
    Description,
    ReceivedAt,
    ClosedAt,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let key = header_key(header);
        let column = match key.as_str() {
            "numero" | "numero_processo" | "numero_do_processo" | "n_processo" | "n_do_processo"
            | "processo" | "number" | "process_number" => Column::Number,
            "requerente" | "titular" | "reclamante" | "denunciante" | "complainant" => {
                Column::Complainant
            }
            "requerido" | "controlador" | "agente_de_tratamento" | "controller" => {
                Column::Controller
            }
            "responsavel" | "responsible" => Column::Responsible,
            "canal_de_entrada" | "canal_entrada" | "canal" | "entry_channel" => {
                Column::EntryChannel
            }
            "situacao" | "status" | "situation" => Column::Situation,
            "encaminhamento" | "referral" => Column::Referral,
            "descricao" | "assunto" | "objeto" | "description" => Column::Description,
            "data_de_entrada" | "data_entrada" | "data_de_recebimento" | "data_recebimento"
            | "recebido_em" | "received_at" => Column::ReceivedAt,
            "data_de_encerramento" | "data_encerramento" | "encerrado_em" | "closed_at" => {
                Column::ClosedAt
            }
            _ => return None,
        };
        Some(column)
    }
}

/// Lowercase, strip accents and join words with `_`
fn header_key(header: &str) -> String {
    let folded: String = header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'º' | '°' | '.' => ' ',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Pick `;` or `,` by whichever appears more often in the header line
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();

    if semicolons > 0 && semicolons >= commas {
        b';'
    } else {
        b','
    }
}

/// Parse `dd/mm/yyyy` or `yyyy-mm-dd`; a trailing time part is ignored
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(date, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .ok()
}

/// Parse an uploaded file into rows
///
/// The outer error aborts the whole import. Each inner result is one data
/// row, either ready to import or rejected with its line number.
pub fn parse(bytes: &[u8]) -> Result<Vec<Result<ImportRow, ImportRowError>>, CsvError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|_| CsvError::Encoding)?;

    if text.trim().is_empty() {
        return Err(CsvError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<Option<Column>> = reader
        .headers()?
        .iter()
        .map(Column::from_header)
        .collect();

    if !columns.contains(&Some(Column::Number)) {
        return Err(CsvError::MissingColumn("numero".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                rows.push(Err(ImportRowError {
                    line,
                    number: None,
                    message: format!("Malformed row: {}", e),
                }));
                continue;
            }
        };

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let cell = |wanted: Column| -> Option<String> {
            columns
                .iter()
                .zip(record.iter())
                .find(|(column, _)| **column == Some(wanted))
                .map(|(_, value)| value.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|value| !value.is_empty())
        };

        rows.push(build_row(line, &cell));
    }

    Ok(rows)
}

fn build_row(
    line: usize,
    cell: &dyn Fn(Column) -> Option<String>,
) -> Result<ImportRow, ImportRowError> {
    let raw_number = cell(Column::Number);
    let fail = |message: String| ImportRowError {
        line,
        number: raw_number.clone(),
        message,
    };

    let number = normalize_process_number(raw_number.as_deref().unwrap_or("")).map_err(fail)?;

    let date = |column: Column, name: &str| -> Result<Option<NaiveDate>, ImportRowError> {
        match cell(column) {
            None => Ok(None),
            Some(raw) => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| fail(format!("Invalid date in {}: {}", name, raw))),
        }
    };
    let received_at = date(Column::ReceivedAt, "data_entrada")?;
    let closed_at = date(Column::ClosedAt, "data_encerramento")?;
    validate_dates(received_at, closed_at).map_err(fail)?;

    // Referenced names are created on the fly, so they get the same limits
    // as the registry endpoints.
    let reference =
        |column: Column, name: &str, max: usize| -> Result<Option<String>, ImportRowError> {
            cell(column)
                .map(|raw| {
                    validation::name(name, &raw, max)
                        .map_err(|_| fail(format!("{} must be at most {} characters", name, max)))
                })
                .transpose()
        };

    Ok(ImportRow {
        line,
        number,
        complainant: reference(Column::Complainant, "requerente", MAX_NAME_LEN)?,
        controller: reference(Column::Controller, "requerido", MAX_NAME_LEN)?,
        responsible: reference(Column::Responsible, "responsavel", MAX_NAME_LEN)?,
        entry_channel: reference(Column::EntryChannel, "canal_entrada", MAX_LOOKUP_NAME_LEN)?,
        situation: reference(Column::Situation, "situacao", MAX_LOOKUP_NAME_LEN)?,
        referral: reference(Column::Referral, "encaminhamento", MAX_LOOKUP_NAME_LEN)?,
        description: cell(Column::Description),
        received_at,
        closed_at,
    })
}
