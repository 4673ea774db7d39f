use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Structural kind of a resource, as declared in a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// `word count` lines, or a JSON object of counts
    Frequency,
    /// One entry per line, or a JSON array of strings
    StringSet,
    /// JSON object mapping categories to terms
    TermCategories,
    /// JSON object of term to term to score
    Similarity,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frequency => write!(f, "frequency"),
            Self::StringSet => write!(f, "string-set"),
            Self::TermCategories => write!(f, "term-categories"),
            Self::Similarity => write!(f, "similarity"),
        }
    }
}

/// A loaded linguistic resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    FrequencyTable(BTreeMap<String, u64>),
    StringSet(BTreeSet<String>),
    /// term -> category
    TermCategories(BTreeMap<String, String>),
    SimilarityTable(BTreeMap<String, BTreeMap<String, f64>>),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::FrequencyTable(_) => ResourceKind::Frequency,
            Self::StringSet(_) => ResourceKind::StringSet,
            Self::TermCategories(_) => ResourceKind::TermCategories,
            Self::SimilarityTable(_) => ResourceKind::Similarity,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::FrequencyTable(m) => m.len(),
            Self::StringSet(s) => s.len(),
            Self::TermCategories(m) => m.len(),
            Self::SimilarityTable(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_frequency_table(&self) -> Option<&BTreeMap<String, u64>> {
        match self {
            Self::FrequencyTable(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_string_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::StringSet(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_term_categories(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::TermCategories(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_similarity_table(&self) -> Option<&BTreeMap<String, BTreeMap<String, f64>>> {
        match self {
            Self::SimilarityTable(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {kind} resource: {message}")]
    Malformed { kind: ResourceKind, message: String },
}

impl ResourceError {
    fn malformed(kind: ResourceKind, message: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            message: message.into(),
        }
    }
}

/// Something a profile can load a resource from.
pub trait ResourceSource: Send + Sync {
    fn load(&self) -> Result<Resource, ResourceError>;

    /// Human readable origin, used in logs.
    fn describe(&self) -> String;
}

/// A resource supplied directly in memory.
#[derive(Clone, Debug)]
pub struct InlineSource(Resource);

impl InlineSource {
    pub fn new(resource: Resource) -> Self {
        Self(resource)
    }
}

impl ResourceSource for InlineSource {
    fn load(&self) -> Result<Resource, ResourceError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("inline {}", self.0.kind())
    }
}

/// A resource read from disk and parsed according to its declared kind.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    kind: ResourceKind,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, kind: ResourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResourceSource for FileSource {
    fn load(&self) -> Result<Resource, ResourceError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ResourceError::NotFound {
                path: self.path.clone(),
            },
            std::io::ErrorKind::InvalidData => {
                ResourceError::malformed(self.kind, "file is not valid UTF-8")
            }
            _ => ResourceError::Read {
                path: self.path.clone(),
                source,
            },
        })?;

        match self.kind {
            ResourceKind::Frequency => parse_frequency_table(&contents).map(Resource::FrequencyTable),
            ResourceKind::StringSet => parse_string_set(&contents).map(Resource::StringSet),
            ResourceKind::TermCategories => {
                parse_term_categories(&contents).map(Resource::TermCategories)
            }
            ResourceKind::Similarity => {
                parse_similarity_table(&contents).map(Resource::SimilarityTable)
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} file {}", self.kind, self.path.display())
    }
}

fn content_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parses `word count` lines (a bare word counts once) or a JSON object of
/// counts. Words are lowercased; repeated words accumulate.
pub fn parse_frequency_table(contents: &str) -> Result<BTreeMap<String, u64>, ResourceError> {
    let kind = ResourceKind::Frequency;
    let mut table = BTreeMap::new();
    if contents.trim_start().starts_with('{') {
        let raw: BTreeMap<String, Value> = serde_json::from_str(contents)
            .map_err(|e| ResourceError::malformed(kind, e.to_string()))?;
        for (word, count) in raw {
            let count = count.as_u64().ok_or_else(|| {
                ResourceError::malformed(kind, format!("count for '{word}' is not a non-negative integer"))
            })?;
            accumulate(&mut table, word.to_lowercase(), count)
                .map_err(|message| ResourceError::malformed(kind, message))?;
        }
        return Ok(table);
    }

    for (line_no, line) in content_lines(contents) {
        let mut parts = line.split_whitespace();
        let word = match parts.next() {
            Some(word) => word.to_lowercase(),
            None => continue,
        };
        let count = match parts.next() {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                ResourceError::malformed(kind, format!("line {line_no}: '{raw}' is not a count"))
            })?,
            None => 1,
        };
        accumulate(&mut table, word, count)
            .map_err(|message| ResourceError::malformed(kind, format!("line {line_no}: {message}")))?;
    }
    Ok(table)
}

fn accumulate(table: &mut BTreeMap<String, u64>, word: String, count: u64) -> Result<(), String> {
    let total = table.entry(word).or_insert(0);
    *total = total
        .checked_add(count)
        .ok_or_else(|| "count overflows a 64-bit total".to_string())?;
    Ok(())
}

/// Parses one entry per line or a JSON array of strings.
pub fn parse_string_set(contents: &str) -> Result<BTreeSet<String>, ResourceError> {
    if contents.trim_start().starts_with('[') {
        return serde_json::from_str::<Vec<String>>(contents)
            .map(|items| items.into_iter().collect())
            .map_err(|e| ResourceError::malformed(ResourceKind::StringSet, e.to_string()));
    }
    Ok(content_lines(contents)
        .map(|(_, line)| line.to_string())
        .collect())
}

/// Parses a JSON object into a term -> category table.
///
/// Accepted shapes per key:
/// - `"masculine": ["il", "lui"]`: every term gets the key as category
/// - `"masculine": {"pronouns": ["il"], "titles": ["monsieur"]}`: nested lists, flattened
/// - `"docteur": "masculine"`: a single term with its category
/// - `"professions": [{"masculine": "acteur", "feminine": "actrice"}]`: each string
///   field maps its value to the field name
pub fn parse_term_categories(contents: &str) -> Result<BTreeMap<String, String>, ResourceError> {
    let kind = ResourceKind::TermCategories;
    let root: Value =
        serde_json::from_str(contents).map_err(|e| ResourceError::malformed(kind, e.to_string()))?;
    let object = root
        .as_object()
        .ok_or_else(|| ResourceError::malformed(kind, "top level must be an object"))?;

    let mut table = BTreeMap::new();
    for (key, value) in object {
        collect_terms(key, value, &mut table)
            .map_err(|message| ResourceError::malformed(kind, format!("'{key}': {message}")))?;
    }
    Ok(table)
}

fn collect_terms(
    key: &str,
    value: &Value,
    table: &mut BTreeMap<String, String>,
) -> Result<(), String> {
    match value {
        Value::String(category) => {
            table.insert(key.to_lowercase(), category.clone());
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(term) => {
                        table.insert(term.to_lowercase(), key.to_string());
                    }
                    Value::Object(fields) => {
                        for (category, term) in fields {
                            if let Value::String(term) = term {
                                table.insert(term.to_lowercase(), category.clone());
                            }
                        }
                    }
                    other => return Err(format!("unexpected list entry {other}")),
                }
            }
        }
        Value::Object(groups) => {
            for group in groups.values() {
                let items = group
                    .as_array()
                    .ok_or_else(|| "nested groups must be lists of terms".to_string())?;
                for item in items {
                    let term = item
                        .as_str()
                        .ok_or_else(|| format!("unexpected nested entry {item}"))?;
                    table.insert(term.to_lowercase(), key.to_string());
                }
            }
        }
        other => return Err(format!("unsupported value {other}")),
    }
    Ok(())
}

/// Parses a JSON object of `term -> {term -> score}`.
pub fn parse_similarity_table(
    contents: &str,
) -> Result<BTreeMap<String, BTreeMap<String, f64>>, ResourceError> {
    serde_json::from_str(contents)
        .map_err(|e| ResourceError::malformed(ResourceKind::Similarity, e.to_string()))
}
