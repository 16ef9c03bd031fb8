//! Markdown to terminal text: headings, emphasis, strong, lists, links, inline and fenced code.
//! Parsing follows CommonMark through `pulldown-cmark`; markup characters are consumed, never
//! printed.

use console::Style;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Styles for each markdown element. `styled == false` renders plain text.
#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub code: Style,
    pub bullet: &'static str,
    styled: bool,
    forced: bool,
}

impl Theme {
    pub fn terminal() -> Self {
        Self {
            heading: Style::new().bold().underlined().cyan(),
            code: Style::new().yellow(),
            bullet: "•",
            styled: true,
            forced: false,
        }
    }

    /// No escape codes; markup is still removed.
    pub fn plain() -> Self {
        Self {
            styled: false,
            ..Self::terminal()
        }
    }

    /// Emits escape codes even when stdout is not a terminal.
    pub fn forced() -> Self {
        Self {
            forced: true,
            ..Self::terminal()
        }
    }
}

/// Renders with [`Theme::terminal`].
pub fn render(text: &str) -> String {
    render_with(text, &Theme::terminal())
}

pub fn render_with(text: &str, theme: &Theme) -> String {
    let mut out = Writer::new(theme);
    for event in Parser::new(text) {
        out.event(event);
    }
    out.finish()
}

/// Inline state while walking parser events. Nesting is counted so `***x***` and
/// `*a **b** c*` close the right spans.
struct Writer<'t> {
    theme: &'t Theme,
    out: String,
    strong: usize,
    emphasis: usize,
    heading: bool,
    code_block: bool,
    /// One entry per open list: the next ordinal, or `None` for bullets.
    lists: Vec<Option<u64>>,
}

impl<'t> Writer<'t> {
    fn new(theme: &'t Theme) -> Self {
        Self {
            theme,
            out: String::new(),
            strong: 0,
            emphasis: 0,
            heading: false,
            code_block: false,
            lists: Vec::new(),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.code_block => {
                for line in text.lines() {
                    self.out.push_str("    ");
                    let painted = self.paint(&self.theme.code, line);
                    self.out.push_str(&painted);
                    self.out.push('\n');
                }
            }
            Event::Text(text) => {
                let painted = self.paint(&self.inline_style(), &text);
                self.out.push_str(&painted);
            }
            Event::Code(code) => {
                let painted = self.paint(&self.theme.code, &code);
                self.out.push_str(&painted);
            }
            Event::Html(raw) | Event::InlineHtml(raw) => self.out.push_str(&raw),
            Event::SoftBreak | Event::HardBreak => self.out.push('\n'),
            Event::Rule => {
                self.blank_line();
                self.out.push_str("────────");
                self.blank_line();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.blank_line();
                self.heading = true;
            }
            Tag::Paragraph if self.lists.is_empty() => self.blank_line(),
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            Tag::CodeBlock(_) => {
                self.blank_line();
                self.code_block = true;
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.blank_line();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.line_break();
                let indent = "  ".repeat(self.lists.len());
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}.", n);
                        *n += 1;
                        marker
                    }
                    _ => self.theme.bullet.to_string(),
                };
                self.out.push_str(&format!("{}{} ", indent, marker));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.heading = false;
                self.blank_line();
            }
            TagEnd::Paragraph if self.lists.is_empty() => self.blank_line(),
            TagEnd::Paragraph | TagEnd::Item => self.line_break(),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::CodeBlock => {
                self.code_block = false;
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            _ => {}
        }
    }

    fn inline_style(&self) -> Style {
        let mut style = if self.heading {
            self.theme.heading.clone()
        } else {
            Style::new()
        };
        if self.strong > 0 {
            style = style.bold();
        }
        if self.emphasis > 0 {
            style = style.italic();
        }
        style
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if !self.theme.styled {
            return text.to_string();
        }
        let style = if self.theme.forced {
            style.clone().force_styling(true)
        } else {
            style.clone()
        };
        style.apply_to(text).to_string()
    }

    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        if self.out.is_empty() {
            return;
        }
        self.line_break();
        if !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out.trim_end_matches('\n').to_string()
    }
}
