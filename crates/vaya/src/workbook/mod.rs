//! Spreadsheet import/export for the family tree.
//!
//! This module converts between the in-memory tree and a tabular workbook
//! representation. Export flattens each member plus its first-found parent
//! and spouse into one worksheet row; import parses the first worksheet of
//! an `.xlsx`/`.xls` file back into row records. Import is parsing only:
//! reconstructing relationships from `parentId`/`spouseId` is left to the
//! caller.
//!
//! Members with several parents or spouses export only the first matching
//! edge. That truncation mirrors the single-parent/single-spouse assumption
//! baked into the row format.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::tree::{FamilyTree, MemberId, MemberSpec, Position};

/// Column headers, in on-disk order.
pub const COLUMNS: [&str; 8] = [
    "id",
    "name",
    "role",
    "birthDate",
    "imageUrl",
    "details",
    "parentId",
    "spouseId",
];

/// Default worksheet name for exports.
pub const DEFAULT_SHEET_NAME: &str = "Family";

/// One worksheet row: a member plus its inferred parent and spouse ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberRow {
    /// Member id, if the row carries one.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Role label.
    pub role: Option<String>,
    /// Birth date as entered.
    pub birth_date: Option<String>,
    /// Avatar image reference.
    pub image_url: Option<String>,
    /// Biography text.
    pub details: Option<String>,
    /// First-found parent id.
    pub parent_id: Option<String>,
    /// First-found spouse id.
    pub spouse_id: Option<String>,
}

impl MemberRow {
    /// Convert this row into a member creation spec.
    ///
    /// The parent/spouse columns are not part of the spec; relationship
    /// reconstruction is the caller's job.
    #[must_use]
    pub fn into_spec(self) -> MemberSpec {
        MemberSpec {
            name: self.name,
            role: self.role.unwrap_or_default(),
            birth_date: self.birth_date,
            avatar_url: self.image_url,
            biography: self.details,
            id: self.id.map(MemberId::from),
            position: Some(Position::random()),
            ..MemberSpec::default()
        }
    }
}

/// Flatten a tree into worksheet rows.
///
/// Each member becomes one row; `parentId` and `spouseId` come from
/// [`FamilyTree::parent_of`] and [`FamilyTree::spouse_of`], so extra parents
/// or spouses are silently truncated to the first found.
#[must_use]
pub fn export_rows(tree: &FamilyTree) -> Vec<MemberRow> {
    tree.members()
        .iter()
        .map(|member| MemberRow {
            id: Some(member.id.to_string()),
            name: member.name.clone(),
            role: Some(member.role.clone()),
            birth_date: member.birth_date.clone(),
            image_url: member.avatar_url.clone(),
            details: member.biography.clone(),
            parent_id: tree.parent_of(&member.id).map(ToString::to_string),
            spouse_id: tree.spouse_of(&member.id).map(ToString::to_string),
        })
        .collect()
}

/// Write rows to an in-memory `.xlsx` workbook.
///
/// # Errors
///
/// Returns an error if workbook serialization fails.
pub fn write_rows_to_buffer(rows: &[MemberRow], sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .map_err(|e| Error::workbook_write(e.to_string()))?;

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col_index(col), *header)
            .map_err(|e| Error::workbook_write(e.to_string()))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = u32::try_from(i + 1).map_err(|_| Error::workbook_write("too many rows"))?;
        let cells = [
            row.id.as_deref(),
            Some(row.name.as_str()),
            row.role.as_deref(),
            row.birth_date.as_deref(),
            row.image_url.as_deref(),
            row.details.as_deref(),
            row.parent_id.as_deref(),
            row.spouse_id.as_deref(),
        ];
        for (col, cell) in cells.iter().enumerate() {
            if let Some(value) = cell {
                worksheet
                    .write_string(r, col_index(col), *value)
                    .map_err(|e| Error::workbook_write(e.to_string()))?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| Error::workbook_write(e.to_string()))
}

/// Export a tree to an `.xlsx` file at the given path.
///
/// # Errors
///
/// Returns an error if the path is not an `.xlsx` file or writing fails.
pub fn write_members(tree: &FamilyTree, path: impl AsRef<Path>, sheet_name: &str) -> Result<()> {
    let path = path.as_ref();
    if extension_of(path).as_deref() != Some("xlsx") {
        return Err(Error::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }

    let rows = export_rows(tree);
    let buffer = write_rows_to_buffer(&rows, sheet_name)?;
    std::fs::write(path, buffer)?;
    info!("Exported {} member(s) to {}", rows.len(), path.display());
    Ok(())
}

/// Import member rows from the first worksheet of a spreadsheet file.
///
/// # Errors
///
/// Returns an error if the extension is not `.xlsx`/`.xls`, the workbook
/// cannot be read, the first worksheet is empty, or the `name` column is
/// missing.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<MemberRow>> {
    let path = path.as_ref();
    match extension_of(path).as_deref() {
        Some("xlsx" | "xls") => {}
        _ => {
            return Err(Error::UnsupportedExtension {
                path: path.to_path_buf(),
            })
        }
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| Error::workbook_read(path, e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::workbook_read(path, "workbook has no worksheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::workbook_read(path, e.to_string()))?;

    let rows = rows_from_range(&range, &sheet_name)?;
    info!("Imported {} member row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// Import member rows from an in-memory `.xlsx` workbook.
///
/// # Errors
///
/// Same failure modes as [`read_rows`], minus the extension check.
pub fn read_rows_from_buffer(bytes: &[u8]) -> Result<Vec<MemberRow>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| Error::workbook_read("<buffer>", e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::workbook_read("<buffer>", "workbook has no worksheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::workbook_read("<buffer>", e.to_string()))?;
    rows_from_range(&range, &sheet_name)
}

/// Parse a worksheet range into member rows.
///
/// The first row is the header; column positions are matched by name,
/// case-insensitively. Rows with a blank name are skipped.
fn rows_from_range(range: &Range<Data>, sheet_name: &str) -> Result<Vec<MemberRow>> {
    let mut rows_iter = range.rows();
    let header = rows_iter.next().ok_or_else(|| Error::EmptyWorksheet {
        name: sheet_name.to_string(),
    })?;

    let find_col = |name: &str| {
        header.iter().position(|cell| {
            cell_to_string(cell)
                .is_some_and(|h| h.trim().eq_ignore_ascii_case(name))
        })
    };

    let name_col = find_col("name").ok_or(Error::MissingColumn { column: "name" })?;
    let id_col = find_col("id");
    let role_col = find_col("role");
    let birth_col = find_col("birthDate");
    let image_col = find_col("imageUrl");
    let details_col = find_col("details");
    let parent_col = find_col("parentId");
    let spouse_col = find_col("spouseId");

    let cell_at = |row: &[Data], col: Option<usize>| {
        col.and_then(|c| row.get(c)).and_then(cell_to_string)
    };

    let mut rows = Vec::new();
    for row in rows_iter {
        let Some(name) = cell_at(row, Some(name_col)) else {
            debug!("Skipping row with blank name");
            continue;
        };
        rows.push(MemberRow {
            id: cell_at(row, id_col),
            name,
            role: cell_at(row, role_col),
            birth_date: cell_at(row, birth_col),
            image_url: cell_at(row, image_col),
            details: cell_at(row, details_col),
            parent_id: cell_at(row, parent_col),
            spouse_id: cell_at(row, spouse_col),
        });
    }

    if rows.is_empty() {
        return Err(Error::EmptyWorksheet {
            name: sheet_name.to_string(),
        });
    }
    Ok(rows)
}

/// Render a cell as a trimmed, non-empty string.
fn cell_to_string(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Excel stores bare numbers as floats; render integers cleanly
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Lowercased file extension of a path.
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

fn col_index(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}
