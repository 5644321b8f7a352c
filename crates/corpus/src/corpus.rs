use crate::error::{CorpusError, Result};
use crate::policy::SearchTextPolicy;
use crate::types::{RawRow, Record, RecordId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content hash identifying one corpus snapshot.
///
/// Derived from the records themselves, never supplied by callers: any change
/// to a row, to the row count, or to the text policy yields a different version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorpusVersion(String);

impl CorpusVersion {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for CorpusVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, immutable set of records.
#[derive(Debug, Clone)]
pub struct Corpus {
    records: Vec<Record>,
    policy: SearchTextPolicy,
    version: CorpusVersion,
}

impl Corpus {
    /// Builds a corpus from ordered rows. An empty input is a configuration error.
    pub fn load<I>(rows: I, policy: &SearchTextPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = RawRow>,
    {
        policy.validate()?;

        let records: Vec<Record> = rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| {
                let search_text = policy.build(&row);
                Record {
                    id: RecordId(idx),
                    display_fields: row.into_fields(),
                    search_text,
                }
            })
            .collect();

        if records.is_empty() {
            return Err(CorpusError::malformed("corpus input contains no rows"));
        }

        let empty_texts = records.iter().filter(|r| r.search_text.is_empty()).count();
        if empty_texts > 0 {
            log::warn!(
                "{empty_texts} of {} records have no searchable text (fields: {:?})",
                records.len(),
                policy.fields
            );
        }

        let version = content_version(&records, policy);
        log::info!(
            "Loaded corpus with {} records (version {})",
            records.len(),
            version.short()
        );

        Ok(Self {
            records,
            policy: policy.clone(),
            version,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a loaded corpus; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.index())
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn search_texts(&self) -> Vec<String> {
        self.records.iter().map(|r| r.search_text.clone()).collect()
    }

    #[must_use]
    pub const fn version(&self) -> &CorpusVersion {
        &self.version
    }

    #[must_use]
    pub const fn policy(&self) -> &SearchTextPolicy {
        &self.policy
    }
}

fn content_version(records: &[Record], policy: &SearchTextPolicy) -> CorpusVersion {
    let mut hasher = Sha256::new();
    update_str(&mut hasher, &policy.separator);
    hasher.update((policy.fields.len() as u64).to_le_bytes());
    for field in &policy.fields {
        update_str(&mut hasher, field);
    }
    hasher.update((records.len() as u64).to_le_bytes());
    for record in records {
        hasher.update((record.display_fields.len() as u64).to_le_bytes());
        for (name, value) in &record.display_fields {
            update_str(&mut hasher, name);
            update_str(&mut hasher, value);
        }
        update_str(&mut hasher, &record.search_text);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    CorpusVersion(hex)
}

// Length-prefixed so adjacent fields cannot alias ("ab","c" vs "a","bc").
fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CRAVING_QUERY_FIELD, DISH_NAME_FIELD, INGREDIENTS_FIELD};
    use pretty_assertions::assert_eq;

    fn dish(name: &str, ingredients: &str) -> RawRow {
        RawRow::new()
            .with_field(DISH_NAME_FIELD, name)
            .with_field(INGREDIENTS_FIELD, ingredients)
            .with_field(CRAVING_QUERY_FIELD, format!("อยากกิน{name}"))
    }

    #[test]
    fn assigns_ids_from_row_order() {
        let corpus = Corpus::load(
            vec![dish("ต้มยำกุ้ง", "กุ้ง"), dish("ผัดไทย", "เส้นจันท์")],
            &SearchTextPolicy::thai_food(),
        )
        .unwrap();

        assert_eq!(corpus.len(), 2);
        let second = corpus.get(RecordId(1)).unwrap();
        assert_eq!(second.id, RecordId(1));
        assert_eq!(second.display(DISH_NAME_FIELD), Some("ผัดไทย"));
        assert_eq!(second.search_text, "เส้นจันท์ อยากกินผัดไทย");
        assert!(corpus.get(RecordId(2)).is_none());
    }

    #[test]
    fn display_fields_pass_through_untouched() {
        let row = dish("แกงเขียวหวาน", "ไก่ กะทิ").with_field("category", "ของคาว");
        let corpus = Corpus::load(vec![row.clone()], &SearchTextPolicy::thai_food()).unwrap();
        assert_eq!(corpus.records()[0].display_fields, row.into_fields());
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = Corpus::load(Vec::<RawRow>::new(), &SearchTextPolicy::thai_food()).unwrap_err();
        assert!(matches!(err, CorpusError::MalformedInput(_)));
    }

    #[test]
    fn version_is_stable_for_identical_content() {
        let rows = || vec![dish("ต้มยำกุ้ง", "กุ้ง"), dish("ผัดไทย", "เส้นจันท์")];
        let a = Corpus::load(rows(), &SearchTextPolicy::thai_food()).unwrap();
        let b = Corpus::load(rows(), &SearchTextPolicy::thai_food()).unwrap();
        assert_eq!(a.version(), b.version());
        assert_eq!(a.version().as_str().len(), 64);
    }

    #[test]
    fn version_changes_with_content_order_and_policy() {
        let base = Corpus::load(
            vec![dish("ต้มยำกุ้ง", "กุ้ง"), dish("ผัดไทย", "เส้นจันท์")],
            &SearchTextPolicy::thai_food(),
        )
        .unwrap();
        let reordered = Corpus::load(
            vec![dish("ผัดไทย", "เส้นจันท์"), dish("ต้มยำกุ้ง", "กุ้ง")],
            &SearchTextPolicy::thai_food(),
        )
        .unwrap();
        let extended = Corpus::load(
            vec![
                dish("ต้มยำกุ้ง", "กุ้ง"),
                dish("ผัดไทย", "เส้นจันท์"),
                dish("ส้มตำ", "มะละกอ"),
            ],
            &SearchTextPolicy::thai_food(),
        )
        .unwrap();
        let other_policy = Corpus::load(
            vec![dish("ต้มยำกุ้ง", "กุ้ง"), dish("ผัดไทย", "เส้นจันท์")],
            &SearchTextPolicy::new([INGREDIENTS_FIELD]).unwrap(),
        )
        .unwrap();

        assert_ne!(base.version(), reordered.version());
        assert_ne!(base.version(), extended.version());
        assert_ne!(base.version(), other_policy.version());
    }
}
