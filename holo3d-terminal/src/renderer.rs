/// ASCII composition of the stage for terminal output
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;

use holo3d_core::FrameBuffer;

/// Character luminosity ramp for intensity (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Caret glyph appended to the script while typing
const CARET: char = '|';

/// Maps the rasterized intensity buffer to terminal characters and lays
/// the typewriter script over the top.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    glyphs: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            glyphs: vec![' '; width * height],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.glyphs.clear();
        self.glyphs.resize(width * height, ' ');
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Convert an intensity buffer into ramp characters
    pub fn compose(&mut self, frame: &FrameBuffer) {
        self.glyphs.fill(' ');
        let height = self.height.min(frame.height());
        let width = self.width.min(frame.width());
        for y in 0..height {
            for x in 0..width {
                let brightness = frame.at(x, y).clamp(0.0, 1.0);
                let index = ((brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize)
                    .min(LUMINOSITY_RAMP.len() - 1);
                self.glyphs[y * self.width + x] = LUMINOSITY_RAMP[index];
            }
        }
    }

    /// Lay the revealed script, centered, over the composed frame
    pub fn overlay_script(&mut self, text: &str, caret_visible: bool) {
        if text.is_empty() && !caret_visible {
            return;
        }
        let mut lines: Vec<Vec<char>> = text.split('\n').map(|l| l.chars().collect()).collect();
        if caret_visible {
            if let Some(last) = lines.last_mut() {
                last.push(CARET);
            }
        }

        let top = self.height.saturating_sub(lines.len()) / 2;
        for (row, line) in lines.iter().enumerate() {
            let y = top + row;
            if y >= self.height {
                break;
            }
            let left = self.width.saturating_sub(line.len()) / 2;
            for (col, &ch) in line.iter().enumerate() {
                let x = left + col;
                if x >= self.width {
                    break;
                }
                self.glyphs[y * self.width + x] = ch;
            }
        }
    }

    /// Flush the character grid, tinted to the hologram palette
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            // Raw mode disables output post-processing, so position each
            // row explicitly instead of relying on newlines.
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let c = self.glyphs[y * self.width + x];

                let color = match c {
                    ' ' | '.' | ':' => Color::DarkBlue,
                    '-' | '=' => Color::Blue,
                    '+' | '*' => Color::Cyan,
                    '#' | '%' | '@' => Color::White,
                    // Script text and caret
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}
