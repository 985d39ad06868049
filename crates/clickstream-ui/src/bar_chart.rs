//! Horizontal text bar charts with value labels.
//!
//! Charts are built as ratatui [`Line`]s, one per bar, so they can be
//! embedded in a widget or flattened to plain text for the console. Output
//! is plain text: no colour is emitted.

use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use clickstream_core::formatting::format_number;

/// Visual configuration of a [`BarChart`].
#[derive(Debug, Clone)]
pub struct BarChartConfig {
    /// Columns used by the longest bar.
    pub width: u16,
    pub filled_char: char,
    /// Decimal places of the value labels.
    pub decimals: u32,
}

impl Default for BarChartConfig {
    fn default() -> Self {
        Self {
            width: 40,
            filled_char: '\u{2588}', // █  FULL BLOCK
            decimals: 0,
        }
    }
}

/// One labelled bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// A titled set of horizontal bars, scaled to the largest value.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    /// Caption of the value axis.
    pub axis: String,
    pub bars: Vec<Bar>,
    pub config: BarChartConfig,
}

impl BarChart {
    pub fn new(title: impl Into<String>, axis: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            axis: axis.into(),
            bars: Vec::new(),
            config: BarChartConfig::default(),
        }
    }

    pub fn decimals(mut self, decimals: u32) -> Self {
        self.config.decimals = decimals;
        self
    }

    pub fn bars<L, I>(mut self, bars: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = (L, f64)>,
    {
        self.bars = bars
            .into_iter()
            .map(|(label, value)| Bar {
                label: label.into(),
                value,
            })
            .collect();
        self
    }

    /// Title line, axis caption, then one line per bar.
    pub fn to_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(self.title.clone()),
            Line::from(format!("({})", self.axis)),
        ];

        if self.bars.is_empty() {
            lines.push(Line::from("(no data)"));
            return lines;
        }

        let label_width = self
            .bars
            .iter()
            .map(|b| b.label.width())
            .max()
            .unwrap_or(0);
        let max_value = self
            .bars
            .iter()
            .map(|b| b.value)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);

        for bar in &self.bars {
            let filled = if max_value > 0.0 && bar.value.is_finite() {
                ((bar.value.max(0.0) / max_value) * self.config.width as f64).round() as usize
            } else {
                0
            };
            let padding = " ".repeat(label_width - bar.label.width());
            let bar_str: String = std::iter::repeat(self.config.filled_char).take(filled).collect();

            lines.push(Line::from(vec![
                Span::raw(format!("{}{} ", bar.label, padding)),
                Span::raw(bar_str),
                Span::raw(format!(" {}", format_number(bar.value, self.config.decimals))),
            ]));
        }
        lines
    }

    /// The chart as plain text, one line per row.
    pub fn render(&self) -> String {
        self.to_lines()
            .iter()
            .map(line_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Concatenated content of a line's spans, without styling.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> BarChart {
        BarChart::new("2019-Oct | Sold products", "Number of purchases")
            .bars(vec![("electronics", 10.0), ("apparel", 5.0), ("kids", 0.0)])
    }

    #[test]
    fn test_to_lines_has_title_axis_and_bars() {
        let lines = chart().to_lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(line_text(&lines[0]), "2019-Oct | Sold products");
        assert_eq!(line_text(&lines[1]), "(Number of purchases)");
    }

    #[test]
    fn test_longest_bar_fills_width() {
        let lines = chart().to_lines();
        assert_eq!(lines[2].spans[1].content.chars().count(), 40);
        assert_eq!(lines[3].spans[1].content.chars().count(), 20);
        assert_eq!(lines[4].spans[1].content.chars().count(), 0);
    }

    #[test]
    fn test_labels_are_aligned() {
        let text = chart().render();
        let rows: Vec<&str> = text.lines().skip(2).collect();
        assert!(rows[0].starts_with("electronics █"));
        assert!(rows[1].starts_with("apparel     █"));
        assert!(rows[2].starts_with("kids        "));
    }

    #[test]
    fn test_value_labels_use_decimals() {
        let text = BarChart::new("t", "a")
            .decimals(3)
            .bars(vec![("view", 2.5), ("cart", 1234.0)])
            .render();
        assert!(text.contains("█ 2.500"));
        assert!(text.ends_with("█ 1,234.000"));
    }

    #[test]
    fn test_render_is_the_text_of_every_line() {
        let chart = chart();
        let expected: Vec<String> = chart.to_lines().iter().map(line_text).collect();
        assert_eq!(chart.render(), expected.join("\n"));
        assert_eq!(chart.to_lines()[2].width(), "electronics ".len() + 40 + " 10".len());
    }

    #[test]
    fn test_empty_chart() {
        let text = BarChart::new("title", "axis").render();
        assert_eq!(text, "title\n(axis)\n(no data)");
    }

    #[test]
    fn test_wide_labels_measured_by_display_width() {
        let text = BarChart::new("t", "a")
            .bars(vec![("家電", 1.0), ("tv", 1.0)])
            .render();
        let rows: Vec<&str> = text.lines().skip(2).collect();
        // "家電" is four columns wide.
        assert!(rows[1].starts_with("tv   █"));
    }
}
