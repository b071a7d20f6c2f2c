//! HTML/Markdown body conversion.
//!
//! The CMS stores rich-text bodies as HTML; files carry Markdown. The two
//! directions are not inverses: whichever side was edited last is
//! authoritative and round-tripping may normalize formatting.
//!
//! HTML to Markdown is a table-driven rewrite of the small tag subset the
//! CMS editor emits. The `RULES` table is the single point of truth for
//! supported tags; rule order matters (block-level rules run before inline
//! rules collapse their contents) and the final rule strips anything left.

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use std::sync::OnceLock;

/// One rewrite step: a case-insensitive, dot-matches-newline pattern and
/// its replacement. `${n}` references capture groups.
struct TagRule {
    pattern: &'static str,
    replacement: &'static str,
}

const RULES: &[TagRule] = &[
    TagRule { pattern: r"&nbsp;", replacement: " " },
    TagRule { pattern: r"<h1[^>]*>(.*?)</h1>", replacement: "# ${1}\n\n" },
    TagRule { pattern: r"<h2[^>]*>(.*?)</h2>", replacement: "## ${1}\n\n" },
    TagRule { pattern: r"<h3[^>]*>(.*?)</h3>", replacement: "### ${1}\n\n" },
    TagRule { pattern: r"<h4[^>]*>(.*?)</h4>", replacement: "#### ${1}\n\n" },
    TagRule { pattern: r"<h5[^>]*>(.*?)</h5>", replacement: "##### ${1}\n\n" },
    TagRule { pattern: r"<h6[^>]*>(.*?)</h6>", replacement: "###### ${1}\n\n" },
    TagRule { pattern: r"<p[^>]*>(.*?)</p>", replacement: "${1}\n\n" },
    TagRule { pattern: r"<strong[^>]*>(.*?)</strong>", replacement: "**${1}**" },
    TagRule { pattern: r"<b[^>]*>(.*?)</b>", replacement: "**${1}**" },
    TagRule { pattern: r"<em[^>]*>(.*?)</em>", replacement: "*${1}*" },
    TagRule { pattern: r"<i[^>]*>(.*?)</i>", replacement: "*${1}*" },
    TagRule {
        pattern: r#"<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#,
        replacement: "[${2}](${1})",
    },
    TagRule {
        pattern: r"<pre[^>]*><code[^>]*>(.*?)</code></pre>",
        replacement: "```\n${1}\n```",
    },
    TagRule { pattern: r"<code[^>]*>(.*?)</code>", replacement: "`${1}`" },
    TagRule { pattern: r"<ul[^>]*>", replacement: "\n" },
    TagRule { pattern: r"</ul>", replacement: "\n" },
    TagRule { pattern: r"<ol[^>]*>", replacement: "\n" },
    TagRule { pattern: r"</ol>", replacement: "\n" },
    TagRule { pattern: r"<li[^>]*>(.*?)</li>", replacement: "- ${1}\n" },
    TagRule { pattern: r"<br\s*/?>", replacement: "\n" },
    TagRule {
        pattern: r"<blockquote[^>]*>(.*?)</blockquote>",
        replacement: "> ${1}\n",
    },
    TagRule {
        pattern: r#"<img[^>]*src="([^"]*)"[^>]*alt="(.*?)"[^>]*>"#,
        replacement: "![${2}](${1})",
    },
    TagRule {
        pattern: r#"<img[^>]*src="([^"]*)"[^>]*>"#,
        replacement: "![](${1})",
    },
    // Anything still tag-shaped after the table ran is dropped.
    TagRule { pattern: r"<[^>]+>", replacement: "" },
];

fn compiled_rules() -> &'static Vec<(Regex, &'static str)> {
    static COMPILED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|rule| {
                let re = Regex::new(&format!("(?is){}", rule.pattern))
                    .unwrap_or_else(|e| panic!("invalid tag rule {:?}: {}", rule.pattern, e));
                (re, rule.replacement)
            })
            .collect()
    })
}

/// Convert a restricted HTML subset to Markdown.
///
/// Lossy by design: unsupported tags are stripped, whitespace is
/// normalized at block boundaries.
pub fn html_to_markdown(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut out = html.to_string();
    for (re, replacement) in compiled_rules() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out.trim().to_string()
}

/// Render Markdown to HTML with the standard renderer.
pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}
