use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::{MatchMode, RuleBook, RuleError, RuleTable, Selection};

static BUILTIN_RULES: Lazy<Arc<CompiledRules>> = Lazy::new(|| {
    Arc::new(
        RuleBook::default()
            .compile()
            .expect("built-in rule book must compile"),
    )
});

#[derive(Debug, Clone)]
enum Matcher {
    Substring(String),
    Word(Regex),
}

impl Matcher {
    fn hits(&self, text: &str) -> bool {
        match self {
            Matcher::Substring(needle) => text.contains(needle.as_str()),
            Matcher::Word(re) => re.is_match(text),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    value: String,
    matchers: Vec<Matcher>,
}

impl CompiledEntry {
    fn hits(&self, text: &str) -> bool {
        self.matchers.iter().any(|m| m.hits(text))
    }
}

#[derive(Debug, Clone)]
pub struct CompiledTable {
    selection: Selection,
    entries: Vec<CompiledEntry>,
}

impl CompiledTable {
    fn compile(name: &str, table: &RuleTable) -> Result<Self, RuleError> {
        let mut entries = Vec::with_capacity(table.entries.len());
        for entry in &table.entries {
            if entry.patterns.is_empty() {
                return Err(RuleError::EmptyEntry {
                    table: name.to_string(),
                    value: entry.value.clone(),
                });
            }
            let mut matchers = Vec::with_capacity(entry.patterns.len());
            for pattern in &entry.patterns {
                let pattern = pattern.to_lowercase();
                let matcher = match table.mode {
                    MatchMode::Substring => Matcher::Substring(pattern),
                    MatchMode::Word => {
                        let re = Regex::new(&format!(r"\b{}\b", regex::escape(&pattern)))
                            .map_err(|source| RuleError::InvalidPattern {
                                field: format!("{name}.{}", entry.value),
                                source,
                            })?;
                        Matcher::Word(re)
                    }
                };
                matchers.push(matcher);
            }
            entries.push(CompiledEntry {
                value: entry.value.clone(),
                matchers,
            });
        }
        Ok(Self {
            selection: table.selection,
            entries,
        })
    }

    pub fn apply<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let mut hits = self
            .entries
            .iter()
            .filter(|e| e.hits(text))
            .map(|e| e.value.as_str());
        match self.selection {
            Selection::First | Selection::Any => hits.next().into_iter().collect(),
            Selection::Last => hits.last().into_iter().collect(),
            Selection::All => hits.collect(),
        }
    }

    pub fn first(&self, text: &str) -> Option<&str> {
        self.apply(text).into_iter().next()
    }

    pub fn matches(&self, text: &str) -> bool {
        !self.apply(text).is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub version: String,
    pub gender: CompiledTable,
    pub occupation: CompiledTable,
    pub education: CompiledTable,
    pub caste_category: CompiledTable,
    pub marital_status: CompiledTable,
    pub disability: CompiledTable,
    pub minority: CompiledTable,
    pub age_range: Regex,
    pub age_min: Regex,
    pub income: Regex,
    pub residency: Regex,
    pub ministry: Option<Regex>,
    source: RuleBook,
}

impl CompiledRules {
    pub fn compile(book: &RuleBook) -> Result<Self, RuleError> {
        let patterns = &book.patterns;
        let ministry = match patterns.ministry.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(compile_pattern("patterns.ministry", p, 1)?),
            _ => None,
        };
        Ok(Self {
            version: book.version.clone(),
            gender: CompiledTable::compile("gender", &book.gender)?,
            occupation: CompiledTable::compile("occupation", &book.occupation)?,
            education: CompiledTable::compile("education", &book.education)?,
            caste_category: CompiledTable::compile("caste_category", &book.caste_category)?,
            marital_status: CompiledTable::compile("marital_status", &book.marital_status)?,
            disability: CompiledTable::compile("disability", &book.disability)?,
            minority: CompiledTable::compile("minority", &book.minority)?,
            age_range: compile_pattern("patterns.age_range", &patterns.age_range, 2)?,
            age_min: compile_pattern("patterns.age_min", &patterns.age_min, 1)?,
            income: compile_pattern("patterns.income", &patterns.income, 1)?,
            residency: compile_pattern("patterns.residency", &patterns.residency, 1)?,
            ministry,
            source: book.clone(),
        })
    }

    pub fn builtin() -> Arc<CompiledRules> {
        Arc::clone(&BUILTIN_RULES)
    }

    pub fn book(&self) -> &RuleBook {
        &self.source
    }
}

fn compile_pattern(field: &str, pattern: &str, groups: usize) -> Result<Regex, RuleError> {
    let re = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        field: field.to_string(),
        source,
    })?;
    if re.captures_len().saturating_sub(1) < groups {
        return Err(RuleError::MissingCapture {
            field: field.to_string(),
            expected: groups,
        });
    }
    Ok(re)
}

#[cfg(test)]
mod tests {
    use crate::rules::{CompiledRules, MatchMode, RuleBook, RuleEntry, RuleTable, Selection};

    fn table(selection: Selection, mode: MatchMode) -> RuleTable {
        RuleTable {
            selection,
            mode,
            entries: vec![
                RuleEntry::new("a", &["alpha"]),
                RuleEntry::new("b", &["beta"]),
                RuleEntry::new("c", &["gamma"]),
            ],
        }
    }

    fn compiled(selection: Selection, mode: MatchMode) -> crate::rules::CompiledTable {
        let mut book = RuleBook::default();
        book.gender = table(selection, mode);
        book.compile().expect("compile").gender
    }

    #[test]
    fn selection_modes_pick_expected_values() {
        let text = "gamma then alpha";
        assert_eq!(compiled(Selection::First, MatchMode::Substring).apply(text), vec!["a"]);
        assert_eq!(compiled(Selection::Last, MatchMode::Substring).apply(text), vec!["c"]);
        assert_eq!(
            compiled(Selection::All, MatchMode::Substring).apply(text),
            vec!["a", "c"]
        );
        assert_eq!(compiled(Selection::Any, MatchMode::Substring).apply(text), vec!["a"]);
        assert!(compiled(Selection::Any, MatchMode::Substring)
            .apply("nothing here")
            .is_empty());
    }

    #[test]
    fn word_mode_requires_boundaries() {
        let table = compiled(Selection::All, MatchMode::Word);
        assert!(table.apply("alphabet soup").is_empty());
        assert_eq!(table.apply("the alpha, the beta."), vec!["a", "b"]);
    }

    #[test]
    fn builtin_is_shared() {
        let a = CompiledRules::builtin();
        let b = CompiledRules::builtin();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
        assert_eq!(a.version, "builtin-1");
    }

    #[test]
    fn blank_ministry_pattern_disables_capture() {
        let mut book = RuleBook::default();
        book.patterns.ministry = Some("  ".to_string());
        let rules = book.compile().expect("compile");
        assert!(rules.ministry.is_none());
    }
}
