//! UTFGrid serializer — the wire format.
//!
//! Output shape:
//!
//! ```text
//! {"grid":["<row>",...],"keys":["",KEY,...],"data":{KEY:PAYLOAD,...}}
//! ```
//!
//! Each cell becomes one character. Feature id `n` is shifted up by 32 and
//! then past `"` (34) and `\` (92), so rows never need escaping and a space
//! always means water.

use std::io::Write;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::GridError;
use crate::grid::IdentifierGrid;
use crate::interner::AttributeInterner;
use crate::types::{FeatureId, WATER};

/// Display code point of the water cell.
pub const WATER_CODE: u32 = 32;

const QUOTE_CODE: u32 = '"' as u32;
const BACKSLASH_CODE: u32 = '\\' as u32;

/// Largest id whose display character stays below the UTF-16 surrogate
/// block. Ids above this have no single-scalar encoding.
pub const MAX_FEATURE_ID: FeatureId = 0xD7FF - 34;

/// Display character for a feature id.
pub fn display_char(id: FeatureId) -> Result<char, GridError> {
    if id > MAX_FEATURE_ID {
        return Err(GridError::UnrepresentableId(id));
    }
    let mut code = id + WATER_CODE;
    if code >= QUOTE_CODE {
        code += 1;
    }
    if code >= BACKSLASH_CODE {
        code += 1;
    }
    char::from_u32(code).ok_or(GridError::UnrepresentableId(id))
}

/// Inverse of [`display_char`]. Returns `None` for characters no id maps to.
pub fn feature_id(ch: char) -> Option<FeatureId> {
    let mut code = ch as u32;
    if code < WATER_CODE || code == QUOTE_CODE || code == BACKSLASH_CODE {
        return None;
    }
    if code > BACKSLASH_CODE {
        code -= 1;
    }
    if code > QUOTE_CODE {
        code -= 1;
    }
    let id = code - WATER_CODE;
    (id <= MAX_FEATURE_ID).then_some(id)
}

pub struct UtfSerializer;

impl UtfSerializer {
    /// Serialize into a string.
    pub fn to_string(grid: &IdentifierGrid, table: &AttributeInterner) -> Result<String, GridError> {
        let mut out = Vec::new();
        Self::write(grid, table, &mut out)?;
        String::from_utf8(out)
            .map_err(|e| GridError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Stream the document to `out`, one row at a time.
    ///
    /// The grid is checked before anything is written, so an unknown or
    /// unrepresentable id produces no partial output.
    pub fn write<W: Write>(
        grid: &IdentifierGrid,
        table: &AttributeInterner,
        out: &mut W,
    ) -> Result<(), GridError> {
        let water = Self::validate(grid, table)?;

        out.write_all(b"{\"grid\":[")?;
        let mut row_text = String::with_capacity(grid.cols() as usize);
        for (i, row) in grid.row_slices().enumerate() {
            if i != 0 {
                out.write_all(b",")?;
            }
            row_text.clear();
            for &id in row {
                row_text.push(display_char(id)?);
            }
            serde_json::to_writer(&mut *out, &row_text)?;
        }

        out.write_all(b"],\"keys\":[")?;
        let mut first = true;
        if water {
            out.write_all(b"\"\"")?;
            first = false;
        }
        for record in table.records() {
            if !first {
                out.write_all(b",")?;
            }
            first = false;
            serde_json::to_writer(&mut *out, &record.key)?;
        }

        out.write_all(b"],\"data\":{")?;
        for (i, record) in table.records().iter().enumerate() {
            if i != 0 {
                out.write_all(b",")?;
            }
            serde_json::to_writer(&mut *out, &record.key)?;
            out.write_all(b":")?;
            out.write_all(record.payload.as_bytes())?;
        }
        out.write_all(b"}}")?;
        Ok(())
    }

    /// Check every cell against the table; returns whether any water remains.
    fn validate(grid: &IdentifierGrid, table: &AttributeInterner) -> Result<bool, GridError> {
        let known = table.len() as u64;
        let mut water = false;
        for &id in grid.row_slices().flatten() {
            if id == WATER {
                water = true;
            } else if id > MAX_FEATURE_ID {
                return Err(GridError::UnrepresentableId(id));
            } else if id as u64 > known {
                return Err(GridError::UnknownFeature(id));
            }
        }
        Ok(water)
    }
}

/// A parsed UTFGrid document, as a map client would see it.
#[derive(Debug, Clone, Deserialize)]
pub struct UtfGrid {
    pub grid: Vec<String>,
    pub keys: Vec<String>,
    pub data: Map<String, Value>,
}

impl UtfGrid {
    pub fn parse(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether any cell is water, which means `keys` starts with the `""`
    /// water key.
    pub fn has_water(&self) -> bool {
        self.grid.iter().any(|row| row.contains(' '))
    }

    /// Feature id at a cell. `Some(0)` is water; `None` is out of bounds or
    /// an undecodable character.
    pub fn id_at(&self, row: usize, col: usize) -> Option<FeatureId> {
        let ch = self.grid.get(row)?.chars().nth(col)?;
        feature_id(ch)
    }

    /// Public key of the feature at a cell; `None` for water.
    pub fn key_at(&self, row: usize, col: usize) -> Option<&str> {
        let id = self.id_at(row, col)?;
        if id == WATER {
            return None;
        }
        let offset = usize::from(self.has_water());
        self.keys
            .get(offset + id as usize - 1)
            .map(String::as_str)
    }

    /// Attribute payload of the feature at a cell; `None` for water.
    pub fn data_at(&self, row: usize, col: usize) -> Option<&Value> {
        self.data.get(self.key_at(row, col)?)
    }
}
