//! Keyword and comment highlighting for program listings
//!
//! Each language profile lists reserved words and comment delimiters. The
//! highlighter scans the source with one alternation pattern and wraps
//! keywords in `<b>` and comments in a gray italic span.

use crate::content_view::normalize::escape_html;
use regex::Regex;
use std::collections::BTreeMap;

const KEYWORD_OPEN: &str = "<b>";
const KEYWORD_CLOSE: &str = "</b>";
const BEFORE_COMMENT: &str = "<font color='gray'>";
const AFTER_COMMENT: &str = "</font>";
const COMMENT_OPEN: &str = "<i>";
const COMMENT_CLOSE: &str = "</i>";

const KUMIR_KEYWORDS: &str = "алг,нач,кон,нц,кц,кц_при,если,то,иначе,все,выбор,при,утв,\
дано,надо,ввод,вывод,пауза,использовать,исп,кон_исп,цел,вещ,лит,сим,лог,таб,\
целтаб,вещтаб,литтаб,симтаб,логтаб,арг,рез,аргрез,пока,для,от,до,знач,\
да,нет,не,и,или,раз,нс,файл,выход,шаг";

const PASCAL_KEYWORDS: &str = "begin,end,program,unit,uses,for,from,to,if,then,else,\
integer,real,string,char,boolean,array,of";

/// Keywords and comment syntax of one language
#[derive(Debug, Clone, Default)]
pub struct LanguageProfile {
    /// Reserved words, matched on word boundaries
    pub keywords: Vec<String>,
    /// Symbol starting a comment that runs to the end of the line
    pub inline_comment: Option<String>,
    /// Start and end symbols of a block comment
    pub multiline_comment: Option<(String, String)>,
}

impl LanguageProfile {
    /// Profile of the Kumir school language
    pub fn kumir() -> Self {
        Self {
            keywords: split_keywords(KUMIR_KEYWORDS),
            inline_comment: Some("|".to_string()),
            multiline_comment: None,
        }
    }

    /// Profile of Pascal
    pub fn pascal() -> Self {
        Self {
            keywords: split_keywords(PASCAL_KEYWORDS),
            inline_comment: Some("//".to_string()),
            multiline_comment: Some(("{".to_string(), "}".to_string())),
        }
    }
}

fn split_keywords(list: &str) -> Vec<String> {
    list.split(',').map(str::to_string).collect()
}

/// A profile with its compiled lexer
#[derive(Debug, Clone)]
struct CompiledProfile {
    profile: LanguageProfile,
    lexer: Option<Regex>,
}

impl CompiledProfile {
    fn new(profile: LanguageProfile) -> Self {
        let lexer = build_lexer(&profile);
        Self { profile, lexer }
    }
}

/// Build the alternation pattern: keywords, inline comment and newline, block comment delimiters
fn build_lexer(profile: &LanguageProfile) -> Option<Regex> {
    if profile.keywords.is_empty() {
        return None;
    }
    let mut alternatives: Vec<String> = profile
        .keywords
        .iter()
        .map(|kw| format!(r"\b{}\b", regex::escape(kw)))
        .collect();
    if let Some(symbol) = profile.inline_comment.as_deref().filter(|s| !s.is_empty()) {
        alternatives.push(regex::escape(symbol));
        alternatives.push(r"\n".to_string());
    }
    if let Some((start, end)) = &profile.multiline_comment {
        if !start.is_empty() && !end.is_empty() {
            alternatives.push(regex::escape(start));
            alternatives.push(regex::escape(end));
        }
    }
    match Regex::new(&alternatives.join("|")) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::warn!("Invalid highlighting pattern, highlighting disabled: {}", e);
            None
        }
    }
}

/// Registry of language profiles
#[derive(Debug, Clone)]
pub struct SourceHighlighter {
    languages: BTreeMap<String, CompiledProfile>,
}

impl Default for SourceHighlighter {
    fn default() -> Self {
        let mut highlighter = Self::empty();
        highlighter.register("kumir", LanguageProfile::kumir());
        highlighter.register("pascal", LanguageProfile::pascal());
        highlighter
    }
}

impl SourceHighlighter {
    /// Highlighter with no languages; every listing passes through
    pub fn empty() -> Self {
        Self {
            languages: BTreeMap::new(),
        }
    }

    /// Register or replace a language profile (keys are case-insensitive)
    pub fn register(&mut self, language: &str, profile: LanguageProfile) {
        self.languages
            .insert(language.to_lowercase(), CompiledProfile::new(profile));
    }

    /// Registered language keys in sorted order
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Highlight `source` as HTML for `language`
    ///
    /// Unknown languages and profiles without keywords return the escaped,
    /// trimmed source.
    pub fn highlight(&self, source: &str, language: &str) -> String {
        let source = source.trim();
        let compiled = self.languages.get(&language.to_lowercase());
        match compiled.and_then(|c| c.lexer.as_ref().map(|lexer| (&c.profile, lexer))) {
            Some((profile, lexer)) => format_source(source, profile, lexer).trim().to_string(),
            None => escape_html(source),
        }
    }
}

fn format_source(source: &str, profile: &LanguageProfile, lexer: &Regex) -> String {
    let inline_symbol = profile.inline_comment.as_deref().unwrap_or("");
    let (multiline_start, multiline_end) = profile
        .multiline_comment
        .as_ref()
        .map(|(s, e)| (s.as_str(), e.as_str()))
        .unwrap_or(("", ""));

    let mut result = String::with_capacity(source.len() * 2);
    let mut inline_comment = false;
    let mut multiline_comment = false;
    let mut position = 0;

    for found in lexer.find_iter(source) {
        result.push_str(&escape_html(&source[position..found.start()]));
        let cap = found.as_str();
        let in_comment = inline_comment || multiline_comment;

        if !in_comment && !inline_symbol.is_empty() && cap == inline_symbol {
            inline_comment = true;
            result.push_str(BEFORE_COMMENT);
            result.push_str(&escape_html(cap));
            result.push_str(COMMENT_OPEN);
        } else if inline_comment && cap == "\n" {
            inline_comment = false;
            result.push_str(COMMENT_CLOSE);
            result.push_str(AFTER_COMMENT);
            result.push('\n');
        } else if !in_comment && !multiline_start.is_empty() && cap == multiline_start {
            multiline_comment = true;
            result.push_str(BEFORE_COMMENT);
            result.push_str(&escape_html(cap));
            result.push_str(COMMENT_OPEN);
        } else if multiline_comment && !multiline_end.is_empty() && cap == multiline_end {
            multiline_comment = false;
            result.push_str(COMMENT_CLOSE);
            result.push_str(&escape_html(cap));
            result.push_str(AFTER_COMMENT);
        } else if profile.keywords.iter().any(|kw| kw == cap) {
            result.push_str(KEYWORD_OPEN);
            result.push_str(cap);
            result.push_str(KEYWORD_CLOSE);
        } else {
            result.push_str(&escape_html(cap));
        }
        position = found.end();
    }
    result.push_str(&escape_html(&source[position..]));

    if inline_comment {
        result.push_str(COMMENT_CLOSE);
        result.push_str(AFTER_COMMENT);
    }
    result
}
