//! A tokenizing inverted index with BM25+ ranking.

use crate::error::{InitError, InitResult, QueryResult, SearchError};
use crate::field::Field;
use crate::options::{CombineWith, IndexOptions, SearchOptions};
use crate::searchers::tokenizer::{term_frequencies, tokenize};
use crate::types::{Record, RecordId, ResultItem};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use strsim::levenshtein;

/// Term frequencies of one term, grouped by field and then by document.
type Postings = BTreeMap<Field, BTreeMap<usize, usize>>;

/// A document as kept by the index.
#[derive(Debug, Clone)]
struct StoredDocument {
  id: RecordId,
  stored: ResultItem,
  field_lengths: BTreeMap<Field, usize>,
}

/// Running totals used to compute the average length of a field.
#[derive(Debug, Clone, Copy, Default)]
struct FieldStats {
  total_terms: usize,
  documents: usize,
}

impl FieldStats {
  fn average(&self) -> f64 {
    if self.documents == 0 {
      0.0
    } else {
      self.total_terms as f64 / self.documents as f64
    }
  }
}

/// A ranked hit from [`InvertedIndex::search`].
///
/// Higher scores are better.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
  pub id: RecordId,
  pub score: f64,
  /// Indexed terms that matched, including prefix and fuzzy expansions.
  pub terms: Vec<String>,
  /// Query terms that found this document.
  pub query_terms: Vec<String>,
  /// Fields each matched term was found in.
  pub matches: BTreeMap<String, BTreeSet<Field>>,
  /// The stored `title` and `author` of the document.
  pub stored: ResultItem,
}

/// Score and match bookkeeping for one document during a query.
#[derive(Debug, Clone, Default)]
struct DocScore {
  score: f64,
  terms: Vec<String>,
  query_terms: Vec<String>,
  matches: BTreeMap<String, BTreeSet<Field>>,
}

impl DocScore {
  fn merge(&mut self, other: DocScore) {
    self.score += other.score;
    for term in other.terms {
      if !self.terms.contains(&term) {
        self.terms.push(term);
      }
    }
    for term in other.query_terms {
      if !self.query_terms.contains(&term) {
        self.query_terms.push(term);
      }
    }
    for (term, fields) in other.matches {
      self.matches.entry(term).or_default().extend(fields);
    }
  }
}

/// An inverted index over record fields.
///
/// Each query term is looked up exactly and, depending on the
/// [`SearchOptions`], expanded to indexed terms it is a prefix of and to
/// indexed terms within a small edit distance. Expansions count for less
/// than exact matches. Per-field BM25+ scores are multiplied by the field's
/// boost and summed per document.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
  options: IndexOptions,
  terms: BTreeMap<String, Postings>,
  documents: Vec<StoredDocument>,
  ids: HashMap<RecordId, usize>,
  field_stats: BTreeMap<Field, FieldStats>,
}

impl InvertedIndex {
  /// Creates an empty index.
  pub fn new(options: IndexOptions) -> InitResult<Self> {
    options.validate()?;
    Ok(Self {
      options,
      terms: BTreeMap::new(),
      documents: Vec::new(),
      ids: HashMap::new(),
      field_stats: BTreeMap::new(),
    })
  }

  /// Number of indexed documents.
  pub fn len(&self) -> usize {
    self.documents.len()
  }

  pub fn is_empty(&self) -> bool {
    self.documents.is_empty()
  }

  /// Number of distinct indexed terms.
  pub fn term_count(&self) -> usize {
    self.terms.len()
  }

  /// Whether a document with this id has been added.
  pub fn contains(&self, id: &RecordId) -> bool {
    self.ids.contains_key(id)
  }

  pub fn options(&self) -> &IndexOptions {
    &self.options
  }

  /// Adds a record under `id`. Ids must be unique within the index.
  pub fn add(&mut self, id: RecordId, record: &Record) -> InitResult<()> {
    if self.ids.contains_key(&id) {
      return Err(InitError::DuplicateId(id));
    }

    let doc = self.documents.len();
    let mut field_lengths = BTreeMap::new();

    for &field in &self.options.fields {
      let Some(text) = field.extract(record) else {
        continue;
      };

      let length = tokenize(text).len();
      field_lengths.insert(field, length);

      let stats = self.field_stats.entry(field).or_default();
      stats.total_terms += length;
      stats.documents += 1;

      for (term, freq) in term_frequencies(text) {
        self
          .terms
          .entry(term)
          .or_default()
          .entry(field)
          .or_default()
          .insert(doc, freq);
      }
    }

    self.ids.insert(id.clone(), doc);
    self.documents.push(StoredDocument {
      id,
      stored: ResultItem::from(record),
      field_lengths,
    });

    Ok(())
  }

  /// Adds every `(id, record)` pair, stopping at the first failure.
  pub fn add_all<'a>(
    &mut self,
    records: impl IntoIterator<Item = (RecordId, &'a Record)>,
  ) -> InitResult<()> {
    for (id, record) in records {
      self.add(id, record)?;
    }
    Ok(())
  }

  /// Searches with the index's default search options.
  pub fn search(&self, query: &str) -> QueryResult<Vec<IndexHit>> {
    self.search_with(query, &self.options.search_options)
  }

  /// Searches with explicit options, returning hits best first.
  pub fn search_with(&self, query: &str, options: &SearchOptions) -> QueryResult<Vec<IndexHit>> {
    if query.trim().is_empty() {
      return Err(SearchError::EmptyQuery);
    }

    let mut query_terms: Vec<String> = Vec::new();
    for term in tokenize(query) {
      if !query_terms.contains(&term) {
        query_terms.push(term);
      }
    }

    let mut combined: Option<BTreeMap<usize, DocScore>> = None;
    for term in &query_terms {
      let results = self.term_results(term, options);
      combined = Some(match combined {
        None => results,
        Some(previous) => Self::combine(previous, results, options.combine_with),
      });
    }

    let mut hits = Vec::new();
    for (doc, scored) in combined.unwrap_or_default() {
      let document = self
        .documents
        .get(doc)
        .ok_or_else(|| SearchError::Internal(format!("posting refers to unknown document {doc}")))?;

      let quality = scored.query_terms.len().max(1) as f64;
      hits.push(IndexHit {
        id: document.id.clone(),
        score: scored.score * quality,
        terms: scored.terms,
        query_terms: scored.query_terms,
        matches: scored.matches,
        stored: document.stored.clone(),
      });
    }

    // Stable sort keeps insertion order for equal scores.
    hits.sort_by(|a, b| {
      b.score
        .partial_cmp(&a.score)
        .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(hits)
  }

  /// Scores every document matching one query term or its expansions.
  fn term_results(&self, query_term: &str, options: &SearchOptions) -> BTreeMap<usize, DocScore> {
    let mut results = BTreeMap::new();
    let query_len = query_term.chars().count();
    let max_distance = options.max_distance(query_len);

    if let Some(postings) = self.terms.get(query_term) {
      self.score_postings(query_term, query_term, postings, 1.0, options, &mut results);
    }

    let mut fuzzy_matches: BTreeMap<&str, usize> = BTreeMap::new();
    if max_distance > 0 {
      for term in self.terms.keys() {
        let term_len = term.chars().count();
        if term_len.abs_diff(query_len) > max_distance {
          continue;
        }
        let distance = levenshtein(query_term, term);
        if distance > 0 && distance <= max_distance {
          fuzzy_matches.insert(term.as_str(), distance);
        }
      }
    }

    if options.prefix {
      let prefixed = self
        .terms
        .range(query_term.to_string()..)
        .take_while(|(term, _)| term.starts_with(query_term));

      for (term, postings) in prefixed {
        let term_len = term.chars().count();
        let distance = term_len - query_len;
        if distance == 0 {
          continue;
        }
        fuzzy_matches.remove(term.as_str());

        let weight =
          options.weights.prefix * term_len as f64 / (term_len as f64 + 0.3 * distance as f64);
        self.score_postings(term, query_term, postings, weight, options, &mut results);
      }
    }

    for (term, distance) in fuzzy_matches {
      let Some(postings) = self.terms.get(term) else {
        continue;
      };
      let term_len = term.chars().count();
      let weight = options.weights.fuzzy * term_len as f64 / (term_len + distance) as f64;
      self.score_postings(term, query_term, postings, weight, options, &mut results);
    }

    results
  }

  /// Adds the weighted BM25+ score of every posting to `results`.
  fn score_postings(
    &self,
    term: &str,
    query_term: &str,
    postings: &Postings,
    weight: f64,
    options: &SearchOptions,
    results: &mut BTreeMap<usize, DocScore>,
  ) {
    let total_docs = self.documents.len();

    for (&field, docs) in postings {
      let boost = options.boost_for(field);
      let avg_length = self
        .field_stats
        .get(&field)
        .map(FieldStats::average)
        .unwrap_or(0.0);

      for (&doc, &freq) in docs {
        let field_length = self
          .documents
          .get(doc)
          .and_then(|d| d.field_lengths.get(&field).copied())
          .unwrap_or(0);

        let raw = options
          .bm25
          .score(freq, docs.len(), total_docs, field_length, avg_length);

        let mut scored = DocScore {
          score: weight * boost * raw,
          terms: vec![term.to_string()],
          query_terms: vec![query_term.to_string()],
          matches: BTreeMap::new(),
        };
        scored.matches.entry(term.to_string()).or_default().insert(field);

        results.entry(doc).or_default().merge(scored);
      }
    }
  }

  fn combine(
    previous: BTreeMap<usize, DocScore>,
    next: BTreeMap<usize, DocScore>,
    combine_with: CombineWith,
  ) -> BTreeMap<usize, DocScore> {
    match combine_with {
      CombineWith::Or => {
        let mut combined = previous;
        for (doc, scored) in next {
          combined.entry(doc).or_default().merge(scored);
        }
        combined
      }
      CombineWith::And => {
        let mut next = next;
        previous
          .into_iter()
          .filter_map(|(doc, mut scored)| {
            let other = next.remove(&doc)?;
            scored.merge(other);
            Some((doc, scored))
          })
          .collect()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Author;

  fn library() -> Vec<Record> {
    vec![
      Record::new("The Hobbit", Author::new("J.R.R.", "Tolkien")),
      Record::new("The Silmarillion", Author::new("J.R.R.", "Tolkien")),
      Record::new("Hobbes and Friends", Author::new("Bill", "Watterson")),
      Record::new("Brave New World", Author::new("Aldous", "Huxley")),
    ]
  }

  fn build(options: IndexOptions) -> InvertedIndex {
    let records = library();
    let mut index = InvertedIndex::new(options).unwrap();
    index
      .add_all(records.iter().enumerate().map(|(i, r)| (RecordId::from(i), r)))
      .unwrap();
    index
  }

  fn ids(hits: &[IndexHit]) -> Vec<RecordId> {
    hits.iter().map(|h| h.id.clone()).collect()
  }

  #[test]
  fn test_exact_term() {
    let index = build(IndexOptions::default());
    let hits = index.search("hobbit").unwrap();

    assert_eq!(ids(&hits), vec![RecordId::Number(0)]);
    assert!(hits[0].score > 0.0);
    assert_eq!(hits[0].stored.title, "The Hobbit");
    assert!(hits[0].matches["hobbit"].contains(&Field::Title));
  }

  #[test]
  fn test_prefix_expansion() {
    let index = build(IndexOptions::default());

    let plain = index.search("hob").unwrap();
    assert!(plain.is_empty());

    let options = SearchOptions::default().prefix(true);
    let hits = index.search_with("hob", &options).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().any(|h| h.terms.contains(&"hobbes".to_string())));
  }

  #[test]
  fn test_fuzzy_expansion() {
    let index = build(IndexOptions::default());
    let options = SearchOptions::default().fuzzy(0.2);
    let hits = index.search_with("tolkin", &options).unwrap();

    assert_eq!(ids(&hits), vec![RecordId::Number(0), RecordId::Number(1)]);
    assert_eq!(hits[0].terms, vec!["tolkien".to_string()]);
  }

  #[test]
  fn test_exact_beats_expansion() {
    let index = build(IndexOptions::default());
    let options = SearchOptions::default().prefix(true).fuzzy(0.2);
    let hits = index.search_with("hobbit", &options).unwrap();

    assert_eq!(hits[0].id, RecordId::Number(0));
  }

  #[test]
  fn test_and_requires_every_term() {
    let index = build(IndexOptions::default());

    let any = SearchOptions::default().combine_with(CombineWith::Or);
    assert_eq!(index.search_with("hobbit silmarillion", &any).unwrap().len(), 2);

    let all = SearchOptions::default().combine_with(CombineWith::And);
    assert!(index.search_with("hobbit silmarillion", &all).unwrap().is_empty());

    let hits = index.search_with("tolkien hobbit", &all).unwrap();
    assert_eq!(ids(&hits), vec![RecordId::Number(0)]);
    assert_eq!(hits[0].query_terms.len(), 2);
  }

  #[test]
  fn test_boost_changes_ranking() {
    let records = vec![
      Record::new("Notes", Author::new("Dune", "Reader")),
      Record::new("Dune", Author::new("Frank", "Herbert")),
    ];
    let options = IndexOptions::default();
    let mut index = InvertedIndex::new(options).unwrap();
    index
      .add_all(records.iter().enumerate().map(|(i, r)| (RecordId::from(i), r)))
      .unwrap();

    let boosted = SearchOptions::default().boost(Field::Title, 2.0);
    let hits = index.search_with("dune", &boosted).unwrap();
    assert_eq!(hits[0].id, RecordId::Number(1));

    let unboosted = SearchOptions::default().boost(Field::AuthorFirstName, 2.0);
    let hits = index.search_with("dune", &unboosted).unwrap();
    assert_eq!(hits[0].id, RecordId::Number(0));
  }

  #[test]
  fn test_duplicate_id_rejected() {
    let records = library();
    let mut index = InvertedIndex::new(IndexOptions::default()).unwrap();
    index.add(RecordId::Number(1), &records[0]).unwrap();

    let err = index.add(RecordId::Number(1), &records[1]).unwrap_err();
    assert!(matches!(err, InitError::DuplicateId(RecordId::Number(1))));
    assert_eq!(index.len(), 1);
  }

  #[test]
  fn test_unindexed_fields_are_ignored() {
    let index = build(IndexOptions::default().fields([Field::Title]));
    assert!(index.search("tolkien").unwrap().is_empty());
    assert!(index.contains(&RecordId::Number(3)));
  }

  #[test]
  fn test_punctuation_only_query() {
    let index = build(IndexOptions::default());
    assert!(index.search("?!").unwrap().is_empty());
    assert_eq!(index.search("  ").unwrap_err(), SearchError::EmptyQuery);
  }
}
