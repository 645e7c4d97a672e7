/*!
format.rs

Human-readable output helpers for the `azmcp` CLI (`list`, `exec`, `check`).
JSON output paths never use these; machine output stays clean.

Style detection:
  - NO_COLOR  disables ANSI color
  - NO_EMOJI  disables emoji prefixes
  - COLUMNS   terminal width hint, clamped to 40..=220 (default 100)

Public API:
  - StyleOptions::detect()
  - color(role, text, &style) / emoji(tag, &style) / status_role(status)
  - box_header(title, subtitle, &style)
  - table(headers, rows, TableOpts, &style)
  - wrap_text / truncate_ellipsis

These functions return strings; callers decide where to print.
*/

use std::borrow::Cow;

/* -------------------------------------------------------------------------- */
/* Style Options                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
    pub padding: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);

        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
            term_width: width,
            padding: 1,
        }
    }

    #[cfg(test)]
    pub fn plain(term_width: usize) -> Self {
        StyleOptions {
            use_color: false,
            use_emoji: false,
            term_width,
            padding: 1,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Color / Emoji                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Warning,
    Error,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",    // cyan-ish
        Role::Secondary => "38;5;250", // gray
        Role::Accent => "38;5;213",    // magenta/pink
        Role::Success => "38;5;82",    // green
        Role::Warning => "38;5;214",   // orange
        Role::Error => "38;5;196",     // red
        Role::Dim => "2",              // faint
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "success" => "✔",
        "error" => "✖",
        "warn" => "⚠",
        "info" => "ℹ",
        "list" => "📜",
        "check" => "🩺",
        _ => "",
    }
}

/// Color for an envelope status: 2xx success, 4xx warning, 5xx error.
pub fn status_role(status: u16) -> Role {
    match status {
        200..=299 => Role::Success,
        400..=499 => Role::Warning,
        _ => Role::Error,
    }
}

/* -------------------------------------------------------------------------- */
/* Box Header                                                                 */
/* -------------------------------------------------------------------------- */

pub fn box_header(
    title: impl AsRef<str>,
    subtitle: Option<impl AsRef<str>>,
    style: &StyleOptions,
) -> String {
    let title_styled = color(Role::Primary, title.as_ref(), style);
    let inner = match subtitle {
        Some(s) => format!(
            "{title_styled}  {}",
            color(Role::Secondary, s.as_ref(), style)
        ),
        None => title_styled,
    };

    let padding = style.padding;
    let max_inner = style.term_width.clamp(20, 200) - 2;
    let inner_len = display_width(&inner);
    let total_inner = (inner_len + padding * 2).min(max_inner);
    let wrap_width = total_inner.saturating_sub(padding * 2).max(1);

    let mut lines = vec![format!("┌{}┐", "─".repeat(total_inner))];
    for w in wrap_text(&inner, wrap_width) {
        let fill = wrap_width.saturating_sub(display_width(&w));
        let pad = " ".repeat(padding);
        lines.push(format!("│{pad}{w}{}{pad}│", " ".repeat(fill)));
    }
    lines.push(format!("└{}┘", "─".repeat(total_inner)));
    lines.join("\n")
}

/* -------------------------------------------------------------------------- */
/* Table Rendering                                                             */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct TableOpts {
    pub max_width: usize,
    pub truncate: bool,
    pub header_sep: bool,
    pub min_col_width: usize,
}

impl Default for TableOpts {
    fn default() -> Self {
        Self {
            max_width: 0, // 0 -> style.term_width
            truncate: true,
            header_sep: true,
            min_col_width: 2,
        }
    }
}

pub fn table(
    headers: &[&str],
    rows: &[Vec<String>],
    opts: TableOpts,
    style: &StyleOptions,
) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let col_count = headers.len();
    let width_limit = if opts.max_width == 0 {
        style.term_width
    } else {
        opts.max_width.min(style.term_width)
    };

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    // Shrink the widest columns first until the row fits.
    let total: usize = widths.iter().sum::<usize>() + (col_count - 1) * 2;
    if total > width_limit {
        let mut overflow = total - width_limit;
        let mut ordered: Vec<(usize, usize)> = widths.iter().copied().enumerate().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));
        for (idx, w) in ordered {
            if overflow == 0 {
                break;
            }
            if w > opts.min_col_width {
                let shrink = (w - opts.min_col_width).min(overflow);
                widths[idx] -= shrink;
                overflow -= shrink;
            }
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| color(Role::Accent, pad_or_truncate(h, widths[i], opts.truncate), style))
        .collect();
    out.push_str(&header_cells.join("  "));
    out.push('\n');

    if opts.header_sep {
        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&color(Role::Dim, sep.join("  "), style));
        out.push('\n');
    }

    let body: Vec<String> = rows
        .iter()
        .map(|row| {
            (0..col_count)
                .map(|c| {
                    let raw = row.get(c).map(String::as_str).unwrap_or("");
                    pad_or_truncate(raw, widths[c], opts.truncate)
                })
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect();
    out.push_str(&body.join("\n"));
    out
}

fn pad_or_truncate(s: &str, width: usize, truncate: bool) -> String {
    let len = display_width(s);
    if len <= width {
        return format!("{s}{}", " ".repeat(width - len));
    }
    if !truncate {
        return s.to_string();
    }
    let cut = truncate_ellipsis(&strip_ansi(s), width);
    let cut_len = display_width(&cut);
    format!("{cut}{}", " ".repeat(width.saturating_sub(cut_len)))
}

/* -------------------------------------------------------------------------- */
/* Text Helpers                                                                */
/* -------------------------------------------------------------------------- */

pub fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if !current.is_empty() && display_width(&current) + display_width(word) + 1 > max_width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/* -------------------------------------------------------------------------- */
/* ANSI / Width Utilities                                                      */
/* -------------------------------------------------------------------------- */

fn strip_ansi(s: &str) -> Cow<'_, str> {
    // Skips CSI sequences: ESC '[' ... letter
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut buf = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for n in chars.by_ref() {
                if n.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        buf.push(c);
    }
    Cow::Owned(buf)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                       */
/* -------------------------------------------------------------------------- */
