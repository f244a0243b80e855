use crate::host::{
    DocumentHandle, FuzzyMatcher, LinkCandidate, LinkFormatter, LinkIndex, MatchSpan, SuggestInput,
};
use log::debug;

pub const PEOPLE_PREFIX: &str = "People/";

#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    File {
        file: DocumentHandle,
        path: String,
        score: i64,
        matches: Option<Vec<MatchSpan>>,
    },
    Alias {
        alias: String,
        file: DocumentHandle,
        path: String,
        score: i64,
        matches: Option<Vec<MatchSpan>>,
    },
    LinkText {
        path: String,
        score: i64,
        matches: Option<Vec<MatchSpan>>,
    },
}

impl Suggestion {
    pub fn score(&self) -> i64 {
        match self {
            Self::File { score, .. } | Self::Alias { score, .. } | Self::LinkText { score, .. } => {
                *score
            }
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Alias { path, .. } | Self::LinkText { path, .. } => {
                path
            }
        }
    }

    pub fn matches(&self) -> Option<&[MatchSpan]> {
        match self {
            Self::File { matches, .. }
            | Self::Alias { matches, .. }
            | Self::LinkText { matches, .. } => matches.as_deref(),
        }
    }

    /// Plain-text label used where highlighting is not available.
    pub fn label(&self) -> &str {
        match self {
            Self::Alias { alias, .. } => alias,
            Self::File { file, .. } => &file.basename,
            Self::LinkText { path, .. } => path,
        }
    }
}

/// What a suggestion row shows.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedSuggestion {
    Plain {
        content: String,
        highlights: Vec<MatchSpan>,
    },
    Complex {
        title: String,
        note: String,
        highlights: Vec<MatchSpan>,
        alias_flair: bool,
    },
}

/// Autocomplete source for person names, limited to link targets under a
/// path prefix.
#[derive(Debug, Clone)]
pub struct PersonSuggest {
    prefix: String,
    source_path: String,
}

impl PersonSuggest {
    pub fn new(prefix: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            source_path: source_path.into(),
        }
    }

    pub fn people(source_path: impl Into<String>) -> Self {
        Self::new(PEOPLE_PREFIX, source_path)
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn get_suggestions(
        &self,
        index: &dyn LinkIndex,
        matcher: &dyn FuzzyMatcher,
        query: &str,
    ) -> Vec<Suggestion> {
        let candidates: Vec<LinkCandidate> = index
            .link_suggestions()
            .into_iter()
            .filter(|candidate| candidate.path.starts_with(&self.prefix))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut suggestions = Vec::with_capacity(candidates.len());
        if query.trim().is_empty() {
            for candidate in candidates {
                suggestions.push(unscored(candidate));
            }
        } else {
            let search = matcher.prepare(query);
            for candidate in candidates {
                let target = match (&candidate.file, &candidate.alias) {
                    (Some(_), Some(alias)) => alias.as_str(),
                    (Some(file), None) => file.path.as_str(),
                    (None, _) => candidate.path.as_str(),
                };
                let Some(found) = search(target) else {
                    continue;
                };
                suggestions.push(scored(candidate, found.score, found.matches));
            }
        }
        // Stable: equal scores keep index order.
        suggestions.sort_by(|a, b| b.score().cmp(&a.score()));
        debug!(
            "person suggestions for {:?}: {} results",
            query,
            suggestions.len()
        );
        suggestions
    }

    pub fn render_suggestion(&self, suggestion: &Suggestion) -> RenderedSuggestion {
        let spans = suggestion.matches().unwrap_or_default();
        match suggestion {
            Suggestion::LinkText { path, .. } => RenderedSuggestion::Plain {
                content: path.clone(),
                highlights: spans.to_vec(),
            },
            Suggestion::Alias { alias, path, .. } => RenderedSuggestion::Complex {
                title: alias.clone(),
                note: path.clone(),
                highlights: spans.to_vec(),
                alias_flair: true,
            },
            Suggestion::File { file, .. } => {
                let offset = file
                    .parent
                    .as_ref()
                    .map(|parent| parent.chars().count() + 1)
                    .unwrap_or(0);
                RenderedSuggestion::Complex {
                    title: file.basename.clone(),
                    note: file.folder_display(),
                    highlights: shift_spans(spans, offset, file.basename.chars().count()),
                    alias_flair: false,
                }
            }
        }
    }

    pub fn link_for(&self, suggestion: &Suggestion, formatter: &dyn LinkFormatter) -> String {
        match suggestion {
            Suggestion::LinkText { path, .. } => format!("[[{path}]]"),
            Suggestion::File { file, .. } => {
                formatter.generate_markdown_link(file, &self.source_path, None, None)
            }
            Suggestion::Alias { alias, file, .. } => {
                formatter.generate_markdown_link(file, &self.source_path, None, Some(alias))
            }
        }
    }

    pub fn select_suggestion(
        &self,
        suggestion: &Suggestion,
        formatter: &dyn LinkFormatter,
        input: &mut dyn SuggestInput,
    ) {
        input.set_value(self.link_for(suggestion, formatter));
        input.trigger_input();
        input.close_suggestions();
    }
}

fn unscored(candidate: LinkCandidate) -> Suggestion {
    match (candidate.file, candidate.alias) {
        (Some(file), Some(alias)) => Suggestion::Alias {
            score: file.mtime,
            alias,
            file,
            path: candidate.path,
            matches: None,
        },
        (Some(file), None) => Suggestion::File {
            score: file.mtime,
            file,
            path: candidate.path,
            matches: None,
        },
        (None, _) => Suggestion::LinkText {
            path: candidate.path,
            score: 0,
            matches: None,
        },
    }
}

fn scored(candidate: LinkCandidate, score: i64, matches: Vec<MatchSpan>) -> Suggestion {
    let matches = Some(matches);
    match (candidate.file, candidate.alias) {
        (Some(file), Some(alias)) => Suggestion::Alias {
            alias,
            file,
            path: candidate.path,
            score,
            matches,
        },
        (Some(file), None) => Suggestion::File {
            file,
            path: candidate.path,
            score,
            matches,
        },
        (None, _) => Suggestion::LinkText {
            path: candidate.path,
            score,
            matches,
        },
    }
}

/// Re-base spans found in a full path onto the basename that starts at
/// `offset`, dropping whatever falls outside it.
fn shift_spans(spans: &[MatchSpan], offset: usize, len: usize) -> Vec<MatchSpan> {
    spans
        .iter()
        .filter_map(|span| {
            let start = span.start.max(offset);
            let end = span.end.min(offset + len);
            (start < end).then(|| MatchSpan {
                start: start - offset,
                end: end - offset,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_spans_clips_to_basename() {
        let spans = [
            MatchSpan { start: 0, end: 2 },
            MatchSpan { start: 6, end: 9 },
            MatchSpan { start: 10, end: 14 },
        ];
        // "People/Ann.md": basename "Ann" at 7..10
        let out = shift_spans(&spans, 7, 3);
        assert_eq!(out, vec![MatchSpan { start: 0, end: 2 }]);
    }

    #[test]
    fn file_render_uses_parent_folder_note() {
        let provider = PersonSuggest::people("Games/Catan.md");
        let file = DocumentHandle::from_path("People/Ann.md", 10);
        let rendered = provider.render_suggestion(&Suggestion::File {
            path: file.path.clone(),
            file,
            score: 10,
            matches: None,
        });
        assert_eq!(
            rendered,
            RenderedSuggestion::Complex {
                title: "Ann".into(),
                note: "People/".into(),
                highlights: Vec::new(),
                alias_flair: false,
            }
        );
    }
}
