use crate::config::{ElementStyles, FolioConfig, RawHtml};
use htmlize::{escape_attribute, escape_text};
use pulldown_cmark::{
    Alignment, CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag,
};

/// Markdown (GFM + math) to HTML with per-element classes.
///
/// Used for prose segments and for the body of nested-markdown figures, so both share one
/// element style set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProseRenderer {
    styles: ElementStyles,
    raw_html: RawHtml,
}

/// How to finish an element opened by a rewritten `Start` event.
enum Close {
    /// Let the HTML writer emit the end tag.
    Passthrough,
    Html(String),
    Table,
}

#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    body_open: bool,
    cell: usize,
}

impl ProseRenderer {
    pub fn new(styles: ElementStyles, raw_html: RawHtml) -> Self {
        Self { styles, raw_html }
    }

    pub fn from_config(config: &FolioConfig) -> Self {
        Self::new(config.prose.clone(), config.render.raw_html)
    }

    pub fn styles(&self) -> &ElementStyles {
        &self.styles
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_MATH
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut events = Vec::new();
        let mut closes: Vec<Close> = Vec::new();
        let mut table = TableState::default();

        for event in Parser::new_ext(markdown, Self::options()) {
            match event {
                Event::Start(tag) => {
                    let (open, close) = self.open_tag(tag, &mut table);
                    events.push(open);
                    closes.push(close);
                }
                Event::End(end) => match closes.pop() {
                    Some(Close::Html(html)) => events.push(Event::Html(html.into())),
                    Some(Close::Table) => {
                        let html = if table.body_open {
                            "</tbody></table>\n"
                        } else {
                            "</table>\n"
                        };
                        table = TableState::default();
                        events.push(Event::Html(html.into()));
                    }
                    Some(Close::Passthrough) | None => events.push(Event::End(end)),
                },
                Event::Code(code) => events.push(Event::Html(
                    format!(
                        "<code{}>{}</code>",
                        class_attr(&self.styles.code),
                        escape_text(&*code)
                    )
                    .into(),
                )),
                Event::Rule => events.push(Event::Html(
                    format!("<hr{} />\n", class_attr(&self.styles.hr)).into(),
                )),
                Event::Html(html) | Event::InlineHtml(html) if self.raw_html == RawHtml::Escape => {
                    events.push(Event::Text(html));
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut out, events.into_iter());
        out
    }

    fn open_tag<'a>(&self, tag: Tag<'a>, table: &mut TableState) -> (Event<'a>, Close) {
        let s = &self.styles;
        match tag {
            Tag::Paragraph => html_pair(format!("<p{}>", class_attr(&s.p)), "</p>\n"),
            Tag::Heading { level, id, .. } => {
                let (name, class) = match level {
                    HeadingLevel::H1 => ("h1", s.h1.as_str()),
                    HeadingLevel::H2 => ("h2", s.h2.as_str()),
                    HeadingLevel::H3 => ("h3", s.h3.as_str()),
                    HeadingLevel::H4 => ("h4", s.h4.as_str()),
                    HeadingLevel::H5 => ("h5", ""),
                    HeadingLevel::H6 => ("h6", ""),
                };
                let id = id
                    .map(|id| format!(r#" id="{}""#, escape_attribute(&*id)))
                    .unwrap_or_default();
                html_pair(
                    format!("<{name}{id}{}>", class_attr(class)),
                    format!("</{name}>\n"),
                )
            }
            Tag::BlockQuote(_) => html_pair(
                format!("<blockquote{}>\n", class_attr(&s.blockquote)),
                "</blockquote>\n",
            ),
            Tag::CodeBlock(kind) => {
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                let code_class = if lang.is_empty() {
                    String::new()
                } else {
                    format!(r#" class="language-{}""#, escape_attribute(lang))
                };
                html_pair(
                    format!("<pre{}><code{code_class}>", class_attr(&s.pre)),
                    "</code></pre>\n",
                )
            }
            Tag::List(Some(start)) => {
                let start_attr = if start == 1 {
                    String::new()
                } else {
                    format!(r#" start="{start}""#)
                };
                html_pair(
                    format!("<ol{start_attr}{}>\n", class_attr(&s.ol)),
                    "</ol>\n",
                )
            }
            Tag::List(None) => html_pair(format!("<ul{}>\n", class_attr(&s.ul)), "</ul>\n"),
            Tag::Item => html_pair(format!("<li{}>", class_attr(&s.li)), "</li>\n"),
            Tag::Emphasis => html_pair(format!("<em{}>", class_attr(&s.em)), "</em>"),
            Tag::Strong => html_pair(format!("<strong{}>", class_attr(&s.strong)), "</strong>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href: CowStr<'_> = if link_type == LinkType::Email {
                    format!("mailto:{}", &*dest_url).into()
                } else {
                    dest_url
                };
                let title = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, escape_attribute(&*title))
                };
                html_pair(
                    format!(
                        r#"<a href="{}"{title}{} target="_blank" rel="noopener noreferrer">"#,
                        escape_attribute(&*href),
                        class_attr(&s.a),
                    ),
                    "</a>",
                )
            }
            Tag::Table(alignments) => {
                *table = TableState {
                    alignments,
                    ..TableState::default()
                };
                (
                    Event::Html(format!("<table{}>\n", class_attr(&s.table)).into()),
                    Close::Table,
                )
            }
            Tag::TableHead => {
                table.in_head = true;
                table.cell = 0;
                html_pair("<thead><tr>".to_string(), "</tr></thead>\n")
            }
            Tag::TableRow => {
                table.in_head = false;
                table.cell = 0;
                let open = if table.body_open {
                    "<tr>"
                } else {
                    table.body_open = true;
                    "<tbody>\n<tr>"
                };
                html_pair(open.to_string(), "</tr>\n")
            }
            Tag::TableCell => {
                let (name, class) = if table.in_head {
                    ("th", s.th.as_str())
                } else {
                    ("td", s.td.as_str())
                };
                let style = match table.alignments.get(table.cell) {
                    Some(Alignment::Left) => r#" style="text-align: left""#,
                    Some(Alignment::Center) => r#" style="text-align: center""#,
                    Some(Alignment::Right) => r#" style="text-align: right""#,
                    Some(Alignment::None) | None => "",
                };
                table.cell += 1;
                html_pair(
                    format!("<{name}{}{style}>", class_attr(class)),
                    format!("</{name}>"),
                )
            }
            Tag::HtmlBlock if self.raw_html == RawHtml::Escape => {
                html_pair(format!("<p{}>", class_attr(&s.p)), "</p>\n")
            }
            other => (Event::Start(other), Close::Passthrough),
        }
    }
}

fn html_pair<'a>(open: String, close: impl Into<String>) -> (Event<'a>, Close) {
    (Event::Html(open.into()), Close::Html(close.into()))
}

fn class_attr(class: &str) -> String {
    let class = class.trim();
    if class.is_empty() {
        String::new()
    } else {
        format!(r#" class="{}""#, escape_attribute(class))
    }
}
