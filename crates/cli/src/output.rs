use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thaifood_corpus::RecordId;
use thaifood_search::SearchHit;

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub top_k: usize,
    pub model_id: String,
    pub corpus_version: String,
    pub results: Vec<ResultRow>,
}

#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub rank: usize,
    pub id: RecordId,
    pub score: f32,
    pub name: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl ResultRow {
    pub fn from_hits(hits: &[SearchHit], name_field: &str) -> Vec<Self> {
        hits.iter()
            .enumerate()
            .map(|(index, hit)| Self {
                rank: index + 1,
                id: hit.record.id,
                score: hit.score,
                name: hit.record.display(name_field).map(str::to_string),
                fields: hit.record.display_fields.clone(),
            })
            .collect()
    }
}

/// Numbered list: title line with the score, then each present detail field
/// indented on its own line.
pub fn render_hits(hits: &[SearchHit], name_field: &str, detail_fields: &[String]) -> String {
    if hits.is_empty() {
        return "No results".to_string();
    }

    let mut out = String::new();
    for (index, hit) in hits.iter().enumerate() {
        let record = &hit.record;
        let title = record
            .display(name_field)
            .filter(|name| !name.trim().is_empty())
            .map_or_else(|| format!("record {}", record.id), str::to_string);
        let _ = writeln!(out, "{}. {title} ({:.4})", index + 1, hit.score);
        for detail in detail_fields
            .iter()
            .filter_map(|field| record.display(field))
            .filter(|detail| !detail.trim().is_empty())
        {
            let _ = writeln!(out, "   {detail}");
        }
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use thaifood_corpus::Record;

    fn hit(id: usize, fields: &[(&str, &str)], score: f32) -> SearchHit {
        SearchHit {
            record: Record {
                id: RecordId(id),
                display_fields: fields
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                search_text: String::new(),
            },
            score,
        }
    }

    fn details() -> Vec<String> {
        vec!["วัตถุดิบ".to_string(), "หมวดหมู่".to_string()]
    }

    #[test]
    fn renders_name_score_and_detail() {
        let hits = vec![
            hit(2, &[("ชื่ออาหาร", "ผัดกะเพราหมู"), ("วัตถุดิบ", "หมู ใบกะเพรา")], 0.71),
            hit(0, &[], 0.5),
        ];
        assert_eq!(
            render_hits(&hits, "ชื่ออาหาร", &details()),
            "1. ผัดกะเพราหมู (0.7100)\n   หมู ใบกะเพรา\n2. record 0 (0.5000)"
        );
    }

    #[test]
    fn renders_every_present_detail_in_order() {
        let hits = vec![hit(
            1,
            &[
                ("หมวดหมู่", "ต้ม"),
                ("ชื่ออาหาร", "ต้มยำกุ้ง"),
                ("วัตถุดิบ", "กุ้ง ข่า ตะไคร้"),
            ],
            0.9,
        )];
        assert_eq!(
            render_hits(&hits, "ชื่ออาหาร", &details()),
            "1. ต้มยำกุ้ง (0.9000)\n   กุ้ง ข่า ตะไคร้\n   ต้ม"
        );
    }

    #[test]
    fn empty_hits_say_so() {
        assert_eq!(render_hits(&[], "ชื่ออาหาร", &details()), "No results");
    }
}
