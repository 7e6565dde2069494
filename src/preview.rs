//! Preview — draws an encoded grid in the terminal.
//!
//! Every cell is printed as its display character on a background colour
//! picked per feature, water as a dim dot, followed by a legend mapping
//! display characters to keys. Used to eyeball coverage before shipping a
//! grid to a map client.

use std::io::Write;

use crossterm::{queue, style};

use crate::error::GridError;
use crate::grid::IdentifierGrid;
use crate::interner::AttributeInterner;
use crate::serializer::display_char;
use crate::types::{FeatureId, WATER};

const WATER_GLYPH: char = '·';

const PALETTE: &[style::Color] = &[
    style::Color::DarkRed,
    style::Color::DarkGreen,
    style::Color::DarkYellow,
    style::Color::DarkBlue,
    style::Color::DarkMagenta,
    style::Color::DarkCyan,
    style::Color::Red,
    style::Color::Green,
    style::Color::Yellow,
    style::Color::Blue,
    style::Color::Magenta,
    style::Color::Cyan,
];

pub struct Preview<'a> {
    grid: &'a IdentifierGrid,
    table: &'a AttributeInterner,
    color: bool,
}

impl<'a> Preview<'a> {
    pub fn new(grid: &'a IdentifierGrid, table: &'a AttributeInterner) -> Self {
        Self {
            grid,
            table,
            color: true,
        }
    }

    /// Plain output without ANSI styling, for pipes and logs.
    pub fn plain(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn render<W: Write>(&self, out: &mut W) -> Result<(), GridError> {
        self.render_grid(out)?;
        self.render_legend(out)?;
        out.flush()?;
        Ok(())
    }

    fn render_grid<W: Write>(&self, out: &mut W) -> Result<(), GridError> {
        for row in self.grid.row_slices() {
            for &id in row {
                self.print_cell(out, id)?;
            }
            queue!(out, style::Print("\n"))?;
        }
        Ok(())
    }

    fn print_cell<W: Write>(&self, out: &mut W, id: FeatureId) -> Result<(), GridError> {
        if id == WATER {
            let mut cs = style::ContentStyle::default();
            if self.color {
                cs.attributes.set(style::Attribute::Dim);
            }
            queue!(out, style::PrintStyledContent(style::StyledContent::new(cs, WATER_GLYPH)))?;
            return Ok(());
        }
        let ch = display_char(id)?;
        let mut cs = style::ContentStyle::default();
        if self.color {
            cs.background_color = Some(feature_color(id));
            cs.foreground_color = Some(style::Color::White);
        }
        queue!(out, style::PrintStyledContent(style::StyledContent::new(cs, ch)))?;
        Ok(())
    }

    fn render_legend<W: Write>(&self, out: &mut W) -> Result<(), GridError> {
        if self.table.is_empty() {
            queue!(out, style::Print("(no features)\n"))?;
            return Ok(());
        }
        for record in self.table.records() {
            let item = format!("[{}] {} {}", display_char(record.id)?, record.key, record.payload);
            self.print_legend_item(out, &item, record.id)?;
            queue!(out, style::Print("\n"))?;
        }
        Ok(())
    }

    /// Print a legend line, bolding the `[...]` swatch and dimming the rest.
    fn print_legend_item<W: Write>(
        &self,
        out: &mut W,
        item: &str,
        id: FeatureId,
    ) -> Result<(), GridError> {
        let Some(close) = item.find("] ") else {
            queue!(out, style::Print(item))?;
            return Ok(());
        };
        let (swatch, rest) = item.split_at(close + 1);
        if !self.color {
            queue!(out, style::Print(swatch), style::Print(rest))?;
            return Ok(());
        }
        queue!(
            out,
            style::SetBackgroundColor(feature_color(id)),
            style::SetAttribute(style::Attribute::Bold),
            style::Print(swatch),
            style::SetAttribute(style::Attribute::Reset),
            style::ResetColor,
            style::SetAttribute(style::Attribute::Dim),
            style::Print(rest),
            style::SetAttribute(style::Attribute::Reset),
        )?;
        Ok(())
    }
}

fn feature_color(id: FeatureId) -> style::Color {
    PALETTE[(id as usize - 1) % PALETTE.len()]
}
