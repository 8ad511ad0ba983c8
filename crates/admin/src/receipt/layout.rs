//! Receipt layout.
//!
//! Positions the document's text and rules on a 400-unit-wide canvas. The
//! canvas grows to fit its content but is never shorter than 600 units.

use super::ReceiptError;
use super::document::{Block, ItemLine, ReceiptDocument, Row, RowStyle};
use super::font::{ADVANCE, GLYPH_HEIGHT, text_width};

pub const CANVAS_WIDTH: u32 = 400;
pub const MIN_CANVAS_HEIGHT: u32 = 600;
pub const MAX_CANVAS_HEIGHT: u32 = 16_384;

const PADDING: u32 = 20;
const CONTENT_WIDTH: u32 = CANVAS_WIDTH - 2 * PADDING;
const BLOCK_GAP: u32 = 20;
const LINE_GAP: u32 = 4;
const PANEL_PADDING: u32 = 8;

const BODY: u32 = 1;
const TITLE: u32 = 2;

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const WHITE: Self = Self([0xFF, 0xFF, 0xFF]);
    pub const INK: Self = Self([0x1E, 0x29, 0x3B]);
    pub const MUTED: Self = Self([0x64, 0x74, 0x8B]);
    pub const RULE: Self = Self([0xE2, 0xE8, 0xF0]);
    pub const PANEL: Self = Self([0xF8, 0xFA, 0xFC]);
    pub const BADGE: Self = Self([0xF1, 0xF5, 0xF9]);
}

/// One drawing instruction in logical units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    /// Solid rectangle.
    Fill {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        color: Color,
    },
    /// One line of text; `size` is the font pixel size.
    Text {
        x: u32,
        y: u32,
        size: u32,
        color: Color,
        bold: bool,
        text: String,
    },
}

/// A fully positioned receipt, painted in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<DrawOp>,
}

impl Layout {
    /// Every text run, top to bottom.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Fill { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Style {
    size: u32,
    color: Color,
    bold: bool,
}

impl Style {
    const fn body(color: Color) -> Self {
        Self {
            size: BODY,
            color,
            bold: false,
        }
    }

    const fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    const fn line_height(self) -> u32 {
        GLYPH_HEIGHT * self.size + LINE_GAP
    }
}

const fn max_chars(width: u32, size: u32) -> usize {
    (width / (ADVANCE * size)) as usize
}

/// Break `text` into lines of at most `max_chars` characters.
///
/// Words longer than a line are split. Blank input yields one empty line.
#[must_use]
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max {
            if len > 0 {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            let rest = chars.split_off(max);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        if len > 0 && len + 1 + chars.len() > max {
            lines.push(std::mem::take(&mut line));
            len = 0;
        }
        if len > 0 {
            line.push(' ');
            len += 1;
        }
        len += chars.len();
        line.extend(chars);
    }

    if len > 0 || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Paint cursor accumulating draw operations.
struct Painter {
    y: u32,
    ops: Vec<DrawOp>,
}

impl Painter {
    fn fill(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color) {
        self.ops.push(DrawOp::Fill {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn rule(&mut self, thickness: u32, color: Color) {
        self.fill(PADDING, self.y, CONTENT_WIDTH, thickness, color);
    }

    fn text_at(&mut self, x: u32, y: u32, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            x,
            y,
            size: style.size,
            color: style.color,
            bold: style.bold,
            text: text.to_string(),
        });
    }

    /// Wrapped text across the box `[left, left + width)`, advancing `y`.
    fn paragraph(&mut self, text: &str, left: u32, width: u32, align: Align, style: Style) {
        for line in wrap(text, max_chars(width, style.size)) {
            let line_width = text_width(&line, style.size);
            let x = match align {
                Align::Left => left,
                Align::Center => left + width.saturating_sub(line_width) / 2,
                Align::Right => left + width.saturating_sub(line_width),
            };
            self.text_at(x, self.y, &line, style);
            self.y += style.line_height();
        }
    }

    fn section_title(&mut self, title: &str) {
        self.paragraph(
            title,
            PADDING,
            CONTENT_WIDTH,
            Align::Left,
            Style::body(Color::INK).bold(),
        );
        self.rule(1, Color::RULE);
        self.y += 6;
    }

    fn inline_row(&mut self, row: &Row, left: u32, width: u32) {
        let label = Style::body(Color::MUTED);
        let value = Style {
            color: Color::INK,
            bold: row.emphasis,
            size: BODY,
        };

        let label_width = text_width(&row.label, BODY) + ADVANCE;
        let top = self.y;
        self.text_at(left, top, &row.label, label);
        self.paragraph(
            &row.value,
            left + label_width,
            width.saturating_sub(label_width),
            Align::Right,
            value,
        );
        self.y = self.y.max(top + label.line_height()) + 1;
    }

    fn stacked_row(&mut self, row: &Row) {
        self.paragraph(
            &row.label,
            PADDING,
            CONTENT_WIDTH,
            Align::Left,
            Style::body(Color::MUTED),
        );
        let value = Style {
            color: Color::INK,
            bold: row.emphasis,
            size: BODY,
        };
        self.paragraph(&row.value, PADDING, CONTENT_WIDTH, Align::Left, value);
        self.y += 4;
    }

    fn item(&mut self, item: &ItemLine) {
        let price_width = text_width(&item.unit_price, BODY).max(text_width(&item.subtotal, BODY));
        let inner_left = PADDING + PANEL_PADDING;
        let inner_width = CONTENT_WIDTH - 2 * PANEL_PADDING;
        let name_width = inner_width.saturating_sub(price_width + 2 * ADVANCE);

        let name_lines = wrap(&item.name, max_chars(name_width, BODY));
        let body = Style::body(Color::INK);
        let lines = u32::try_from(name_lines.len()).unwrap_or(u32::MAX).saturating_add(1).max(2);
        let height = lines * body.line_height() + 2 * PANEL_PADDING;

        let top = self.y;
        self.fill(PADDING, top, CONTENT_WIDTH, height, Color::PANEL);

        let mut y = top + PANEL_PADDING;
        for line in &name_lines {
            self.text_at(inner_left, y, line, body.bold());
            y += body.line_height();
        }
        self.text_at(inner_left, y, &item.quantity, Style::body(Color::MUTED));

        let right = inner_left + inner_width;
        let first = top + PANEL_PADDING;
        self.text_at(
            right - text_width(&item.unit_price, BODY),
            first,
            &item.unit_price,
            body.bold(),
        );
        self.text_at(
            right - text_width(&item.subtotal, BODY),
            first + body.line_height(),
            &item.subtotal,
            Style::body(Color::MUTED),
        );

        self.y = top + height + 6;
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Header {
                title,
                tagline,
                subtitle,
            } => {
                let title_style = Style {
                    size: TITLE,
                    color: Color::INK,
                    bold: true,
                };
                self.paragraph(title, PADDING, CONTENT_WIDTH, Align::Center, title_style);
                self.y += 2;
                let muted = Style::body(Color::MUTED);
                self.paragraph(tagline, PADDING, CONTENT_WIDTH, Align::Center, muted);
                self.paragraph(subtitle, PADDING, CONTENT_WIDTH, Align::Center, muted);
                self.y += 8;
                self.rule(2, Color::INK);
                self.y += 2;
            }
            Block::Section { title, style, rows } => {
                self.section_title(title);
                for row in rows {
                    match style {
                        RowStyle::Inline => self.inline_row(row, PADDING, CONTENT_WIDTH),
                        RowStyle::Stacked => self.stacked_row(row),
                    }
                }
            }
            Block::Items { title, lines } => {
                self.section_title(title);
                for item in lines {
                    self.item(item);
                }
            }
            Block::Summary { title, rows, total } => {
                let index = self.ops.len();
                let top = self.y;
                self.y += PANEL_PADDING + 4;

                let inner_left = PADDING + PANEL_PADDING + 4;
                let inner_width = CONTENT_WIDTH - 2 * (PANEL_PADDING + 4);
                self.paragraph(
                    title,
                    inner_left,
                    inner_width,
                    Align::Left,
                    Style::body(Color::INK).bold(),
                );
                self.y += 4;
                for row in rows {
                    self.inline_row(row, inner_left, inner_width);
                }
                self.y += 4;
                self.fill(inner_left, self.y, inner_width, 1, Color::RULE);
                self.y += 6;
                self.inline_row(total, inner_left, inner_width);
                self.y += PANEL_PADDING;

                let height = self.y - top;
                let panel = [
                    panel_fill(PADDING, top, CONTENT_WIDTH, height, Color::RULE),
                    panel_fill(PADDING + 1, top + 1, CONTENT_WIDTH - 2, height - 2, Color::PANEL),
                ];
                self.ops.splice(index..index, panel);
            }
            Block::Footer { lines, meta } => {
                self.rule(2, Color::INK);
                self.y += 15;
                for (i, line) in lines.iter().enumerate() {
                    let style = if i == 0 {
                        Style::body(Color::INK).bold()
                    } else {
                        Style::body(Color::MUTED)
                    };
                    self.paragraph(line, PADDING, CONTENT_WIDTH, Align::Center, style);
                }
                self.y += 10;

                let index = self.ops.len();
                let top = self.y;
                self.y += PANEL_PADDING;
                for line in meta {
                    self.paragraph(
                        line,
                        PADDING + PANEL_PADDING,
                        CONTENT_WIDTH - 2 * PANEL_PADDING,
                        Align::Center,
                        Style::body(Color::MUTED),
                    );
                }
                self.y += PANEL_PADDING - LINE_GAP;
                let badge = panel_fill(PADDING, top, CONTENT_WIDTH, self.y - top, Color::BADGE);
                self.ops.insert(index, badge);
            }
        }
    }
}

const fn panel_fill(x: u32, y: u32, width: u32, height: u32, color: Color) -> DrawOp {
    DrawOp::Fill {
        x,
        y,
        width,
        height,
        color,
    }
}

/// Position every block of `document`.
///
/// # Errors
///
/// Returns `ReceiptError::Layout` if the content does not fit the maximum
/// canvas height.
pub fn layout(document: &ReceiptDocument) -> Result<Layout, ReceiptError> {
    let mut painter = Painter {
        y: PADDING,
        ops: Vec::new(),
    };

    for (i, block) in document.blocks.iter().enumerate() {
        if i > 0 {
            painter.y += BLOCK_GAP;
        }
        painter.block(block);
    }

    let height = (painter.y + PADDING).max(MIN_CANVAS_HEIGHT);
    if height > MAX_CANVAS_HEIGHT {
        return Err(ReceiptError::Layout(format!(
            "receipt needs {height} units, limit is {MAX_CANVAS_HEIGHT}"
        )));
    }

    let mut ops = Vec::with_capacity(painter.ops.len() + 5);
    ops.push(panel_fill(0, 0, CANVAS_WIDTH, height, Color::WHITE));
    ops.extend(painter.ops);
    // 2-unit border
    ops.extend([
        panel_fill(0, 0, CANVAS_WIDTH, 2, Color::INK),
        panel_fill(0, height - 2, CANVAS_WIDTH, 2, Color::INK),
        panel_fill(0, 0, 2, height, Color::INK),
        panel_fill(CANVAS_WIDTH - 2, 0, 2, height, Color::INK),
    ]);

    Ok(Layout {
        width: CANVAS_WIDTH,
        height,
        ops,
    })
}
