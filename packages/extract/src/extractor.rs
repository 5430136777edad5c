//! Anchor-delimited record segmentation.
//!
//! The text is cut at every `Anchor:` occurrence. Each resulting span is
//! matched against every keyword once, and the span becomes a record only
//! if it yields a value for the anchor itself.

use pdf_records_record_models::{Keyword, KeywordList, Record};
use regex::Regex;

use crate::ExtractError;

/// Locates `Keyword:` (plus trailing whitespace) for a single keyword.
#[derive(Debug)]
struct FieldMatcher {
    keyword: Keyword,
    regex: Regex,
}

/// Compiled matchers for one [`KeywordList`].
#[derive(Debug)]
pub struct RecordExtractor {
    keywords: KeywordList,
    fields: Vec<FieldMatcher>,
    /// `Anchor:`; each match starts a record.
    anchor: Regex,
    /// `AnyKeyword:`; the first match after a value ends that value.
    field_boundary: Regex,
}

/// Regex fragment matching `keyword` on a word boundary.
///
/// The leading `\b` only makes sense when the keyword starts with a word
/// character; `#Ref` would otherwise require a word character before `#`.
fn keyword_pattern(keyword: &Keyword) -> String {
    let escaped = regex::escape(keyword.as_str());
    let starts_with_word = keyword
        .as_str()
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');

    if starts_with_word {
        format!(r"\b{escaped}")
    } else {
        escaped
    }
}

/// Collapses whitespace runs (newlines included) to single spaces and trims.
fn normalize_value(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl RecordExtractor {
    /// Compiles the matchers for `keywords`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Regex`] if a keyword pattern fails to
    /// compile (e.g. an extremely long label exceeding the size limit).
    pub fn new(keywords: KeywordList) -> Result<Self, ExtractError> {
        let fields = keywords
            .iter()
            .map(|keyword| {
                let regex = Regex::new(&format!(r"(?i){}\s*:\s*", keyword_pattern(keyword)))?;
                Ok(FieldMatcher {
                    keyword: keyword.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let anchor = Regex::new(&format!(r"(?i){}\s*:", keyword_pattern(keywords.anchor())))?;

        let alternatives = keywords
            .iter()
            .map(keyword_pattern)
            .collect::<Vec<_>>()
            .join("|");
        let field_boundary = Regex::new(&format!(r"(?i)(?:{alternatives})\s*:"))?;

        log::debug!(
            "Compiled {} keyword matchers (anchor: {})",
            fields.len(),
            keywords.anchor()
        );

        Ok(Self {
            keywords,
            fields,
            anchor,
            field_boundary,
        })
    }

    /// Byte offsets where each record starts (every `Anchor:` occurrence).
    #[must_use]
    pub fn boundaries(&self, text: &str) -> Vec<usize> {
        self.anchor.find_iter(text).map(|m| m.start()).collect()
    }

    /// Extracts all records from `text`, in the order their anchors appear.
    ///
    /// Text before the first anchor is ignored. Spans whose anchor value is
    /// empty are dropped.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<Record> {
        let boundaries = self.boundaries(text);

        if boundaries.is_empty() {
            // Single pass over the whole text. The anchor matcher uses the
            // same pattern as the boundary scan, so this finds nothing.
            log::debug!(
                "No '{}:' occurrences found; trying the whole text as one record",
                self.keywords.anchor()
            );
            return self.extract_span(text).into_iter().collect();
        }

        let ends = boundaries
            .iter()
            .skip(1)
            .copied()
            .chain(std::iter::once(text.len()));

        let records: Vec<Record> = boundaries
            .iter()
            .zip(ends)
            .filter_map(|(&start, end)| self.extract_span(&text[start..end]))
            .collect();

        log::debug!(
            "Found {} record boundaries, extracted {} records",
            boundaries.len(),
            records.len()
        );

        records
    }

    /// Applies every keyword matcher once to `span`.
    ///
    /// Returns `None` unless the anchor produced a non-empty value.
    fn extract_span(&self, span: &str) -> Option<Record> {
        let mut record = Record::new();

        for field in &self.fields {
            let Some(label) = field.regex.find(span) else {
                continue;
            };

            let value_start = label.end();
            let value_end = self
                .field_boundary
                .find_at(span, value_start)
                .map_or(span.len(), |next| next.start());

            let value = normalize_value(&span[value_start..value_end]);
            if !value.is_empty() {
                record.insert(field.keyword.clone(), value);
            }
        }

        record
            .contains(self.keywords.anchor().as_str())
            .then_some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(labels: &[&str]) -> RecordExtractor {
        RecordExtractor::new(KeywordList::new(labels).unwrap()).unwrap()
    }

    fn pairs(record: &Record) -> Vec<(&str, &str)> {
        record.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    #[test]
    fn extracts_one_record_per_anchor() {
        let ex = extractor(&["ID", "Color", "Model", "Year"]);
        let text = "ID: 101 Color: Red Model: Civic Year: 2020 ID: 102 Color: Blue Model: Accord Year: 2021";

        let records = ex.extract(text);

        assert_eq!(records.len(), 2);
        assert_eq!(
            pairs(&records[0]),
            vec![("ID", "101"), ("Color", "Red"), ("Model", "Civic"), ("Year", "2020")]
        );
        assert_eq!(
            pairs(&records[1]),
            vec![("ID", "102"), ("Color", "Blue"), ("Model", "Accord"), ("Year", "2021")]
        );
    }

    #[test]
    fn missing_field_is_omitted() {
        let ex = extractor(&["ID", "Color", "Model", "Year"]);

        let records = ex.extract("ID: 103 Color: Green Year: 2019");

        assert_eq!(records.len(), 1);
        assert_eq!(
            pairs(&records[0]),
            vec![("ID", "103"), ("Color", "Green"), ("Year", "2019")]
        );
        assert!(!records[0].contains("Model"));
    }

    #[test]
    fn no_anchor_yields_no_records() {
        let ex = extractor(&["ID", "Color"]);
        assert!(ex.extract("Color: Red Model: Civic").is_empty());
        assert!(ex.extract("").is_empty());
    }

    #[test]
    fn anchor_inside_longer_word_is_not_a_boundary() {
        let ex = extractor(&["ID", "Flag"]);

        assert!(ex.boundaries("VALID: true INVALID: false").is_empty());
        // The whole-text fallback cannot find the anchor either.
        assert!(ex.extract("VALID: true Flag: x").is_empty());

        let records = ex.extract("VALID: true ID: 5 Flag: VALID: no");
        assert_eq!(records.len(), 1);
        assert_eq!(pairs(&records[0]), vec![("ID", "5"), ("Flag", "VALID: no")]);
    }

    #[test]
    fn matching_ignores_case() {
        let ex = extractor(&["ID", "Color"]);

        let lower = ex.extract("id: 5 color: red");
        let upper = ex.extract("ID: 5 COLOR: red");

        assert_eq!(lower, upper);
        assert_eq!(pairs(&lower[0]), vec![("ID", "5"), ("Color", "red")]);
    }

    #[test]
    fn values_never_cross_into_the_next_field() {
        let labels = ["ID", "Color", "Model", "Year"];
        let ex = extractor(&labels);
        let text = "ID:1 Color:Red Model :Civic Year:2020\nID : 2 Color:\tBlue Model:Accord Year: 2021";

        let records = ex.extract(text);

        assert_eq!(records.len(), 2);
        for record in &records {
            for (_, value) in record.iter() {
                for label in labels {
                    assert!(
                        !value.to_lowercase().contains(&format!("{}:", label.to_lowercase())),
                        "value {value:?} leaked into field {label}"
                    );
                }
            }
        }
        assert_eq!(records[0].get("Model"), Some("Civic"));
        assert_eq!(records[1].get("Color"), Some("Blue"));
    }

    #[test]
    fn yields_n_records_in_source_order() {
        let ex = extractor(&["ID", "Name"]);
        let text: String = (0..50)
            .map(|i| format!("ID: {i}\nName: item {i}\n\n"))
            .collect();

        let records = ex.extract(&text);

        assert_eq!(records.len(), 50);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.get("ID"), Some(i.to_string().as_str()));
            assert_eq!(record.get("Name"), Some(format!("item {i}").as_str()));
        }
    }

    #[test]
    fn collapses_whitespace_across_lines() {
        let ex = extractor(&["ID", "Color", "Model"]);

        let records = ex.extract("ID: 42\nColor:   Deep\n   Blue  \nModel: X");

        assert_eq!(records[0].get("Color"), Some("Deep Blue"));
    }

    #[test]
    fn keys_follow_keyword_order_not_text_order() {
        let ex = extractor(&["ID", "Color", "Year"]);

        let records = ex.extract("ID: 1 Year: 2020 Color: Red");

        let keys: Vec<&str> = records[0].keys().map(Keyword::as_str).collect();
        assert_eq!(keys, vec!["ID", "Color", "Year"]);
    }

    #[test]
    fn text_before_first_anchor_is_ignored() {
        let ex = extractor(&["ID", "Color"]);

        let records = ex.extract("Inventory report Color: Purple\nID: 1 Color: Red");

        assert_eq!(records.len(), 1);
        assert_eq!(pairs(&records[0]), vec![("ID", "1"), ("Color", "Red")]);
    }

    #[test]
    fn span_with_empty_anchor_value_is_dropped() {
        let ex = extractor(&["ID", "Color"]);

        let records = ex.extract("ID: Color: Red ID: 2 Color: Blue");

        assert_eq!(records.len(), 1);
        assert_eq!(pairs(&records[0]), vec![("ID", "2"), ("Color", "Blue")]);
    }

    #[test]
    fn first_match_wins_within_a_record() {
        let ex = extractor(&["ID", "Color"]);

        let records = ex.extract("ID: 1 Color: Red Color: Blue");

        assert_eq!(records[0].get("Color"), Some("Red"));
    }

    #[test]
    fn keywords_with_regex_metacharacters_are_literal() {
        let ex = extractor(&["Part #", "Price ($)"]);

        let records = ex.extract("Part #: A-1 Price ($): 9.99 Part #: B-2 Price ($): 1.50");

        assert_eq!(records.len(), 2);
        assert_eq!(pairs(&records[1]), vec![("Part #", "B-2"), ("Price ($)", "1.50")]);
    }

    #[test]
    fn keyword_starting_with_symbol_still_matches() {
        let ex = extractor(&["#Ref", "Qty"]);

        let records = ex.extract("#Ref: 10 Qty: 3 #Ref: 11 Qty: 4");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("#Ref"), Some("10"));
        assert_eq!(records[1].get("Qty"), Some("4"));
    }

    #[test]
    fn longer_keyword_sharing_a_prefix_ends_values() {
        let ex = extractor(&["ID", "Color", "Color Code"]);

        let records = ex.extract("ID: 1 Color: Red Color Code: #f00");

        assert_eq!(
            pairs(&records[0]),
            vec![("ID", "1"), ("Color", "Red"), ("Color Code", "#f00")]
        );
    }

    #[test]
    fn preserves_non_ascii_values() {
        let ex = extractor(&["Nom", "Ville"]);

        let records = ex.extract("Nom: Zoë Ville: Orléans Nom: Jürgen Ville: Köln");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Ville"), Some("Orléans"));
        assert_eq!(records[1].get("Nom"), Some("Jürgen"));
    }
}
