use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const CORPUS: &str = r#"[
  {"ชื่ออาหาร": "ไก่ผัดกะเพรา", "วัตถุดิบ_ไม่มีปริมาณ": "ไก่ ใบกะเพรา พริก กระเทียม", "query1 อยากกินอาหารครบ": "อยากกินผัดกะเพรา", "หมวดหมู่": "อาหารจานเดียว"},
  {"ชื่ออาหาร": "ต้มยำกุ้ง", "วัตถุดิบ_ไม่มีปริมาณ": "กุ้ง ข่า ตะไคร้ ใบมะกรูด", "query1 อยากกินอาหารครบ": "อยากกินต้มยำน้ำใส"},
  {"ชื่ออาหาร": "ผัดกะเพราหมู", "วัตถุดิบ_ไม่มีปริมาณ": "หมูสับ ใบกะเพรา พริก", "query1 อยากกินอาหารครบ": "อยากกินกะเพราหมูสับ", "หมวดหมู่": "อาหารจานเดียว", "แคลอรี่": 580}
]"#;

fn setup() -> TempDir {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("thai_food.json"), CORPUS).expect("write corpus");
    temp
}

#[allow(deprecated)]
fn thaifood(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("thaifood").expect("binary");
    cmd.current_dir(workdir)
        .env("THAIFOOD_EMBEDDING_MODE", "stub")
        .env_remove("THAIFOOD_CORPUS")
        .env_remove("THAIFOOD_TOP_K")
        .env_remove("RUST_LOG");
    cmd
}

fn search_json(workdir: &Path, args: &[&str]) -> Value {
    let output = thaifood(workdir)
        .arg("search")
        .args(args)
        .arg("--json")
        .output()
        .expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn json_search_ranks_shared_dish_words_first() {
    let temp = setup();
    let body = search_json(temp.path(), &["กะเพรา", "--top-k", "2"]);

    let results = body["results"].as_array().expect("results");
    assert_eq!(results.len(), 2);
    let ids: BTreeSet<u64> = results.iter().filter_map(|r| r["id"].as_u64()).collect();
    assert_eq!(ids, BTreeSet::from([0, 2]));
    assert_eq!(results[0]["rank"], 1);
    assert_eq!(body["query"], "กะเพรา");
    assert_eq!(body["model_id"], "stub-trigram");
    assert_eq!(body["corpus_version"].as_str().map(str::len), Some(64));
}

#[test]
fn default_top_k_is_three_and_oversized_top_k_is_capped() {
    let temp = setup();
    let body = search_json(temp.path(), &["ต้มยำ"]);
    assert_eq!(body["top_k"], 3);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["results"][0]["name"], "ต้มยำกุ้ง");

    let body = search_json(temp.path(), &["ต้มยำ", "-n", "50"]);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(3));
}

#[test]
fn numeric_fields_pass_through_as_text() {
    let temp = setup();
    let body = search_json(temp.path(), &["หมูสับ", "-n", "1"]);
    assert_eq!(body["results"][0]["fields"]["แคลอรี่"], "580");
}

#[test]
fn text_output_lists_dish_names_with_ingredients_and_category() {
    let temp = setup();
    thaifood(temp.path())
        .args(["search", "กะเพรา", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1. "))
        .stdout(predicate::str::contains("ใบกะเพรา"))
        .stdout(predicate::str::contains("\n   อาหารจานเดียว"));
}

#[test]
fn misspelled_embedding_mode_is_a_config_error() {
    let temp = setup();
    fs::write(temp.path().join("thaifood.toml"), "[embedding]\nmode = \"stbu\"\n")
        .expect("write config");
    thaifood(temp.path())
        .env_remove("THAIFOOD_EMBEDDING_MODE")
        .args(["search", "กะเพรา"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn blank_query_is_rejected() {
    let temp = setup();
    thaifood(temp.path())
        .args(["search", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Empty query"));
}

#[test]
fn missing_corpus_file_is_reported() {
    let temp = tempdir().expect("tempdir");
    thaifood(temp.path())
        .args(["search", "ส้มตำ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read corpus file"));
}

#[test]
fn empty_corpus_is_a_hard_error() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("thai_food.json"), "[]").expect("write corpus");
    thaifood(temp.path())
        .args(["search", "ส้มตำ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load corpus"));
}

#[test]
fn config_file_and_flags_layer_in_order() {
    let temp = setup();
    let menu = temp.path().join("menu.json");
    fs::copy(temp.path().join("thai_food.json"), &menu).expect("copy corpus");
    fs::remove_file(temp.path().join("thai_food.json")).expect("remove default corpus");
    fs::write(
        temp.path().join("thaifood.toml"),
        format!(
            "corpus_path = {:?}\ntop_k = 1\n\n[embedding]\nmode = \"stub\"\ndimension = 128\n",
            menu.display().to_string()
        ),
    )
    .expect("write config");

    let body = search_json(temp.path(), &["กะเพรา"]);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(1));

    let body = search_json(temp.path(), &["กะเพรา", "--top-k", "2"]);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(2));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let temp = setup();
    fs::write(temp.path().join("thaifood.toml"), "hf_token = \"hf_xxx\"\n").expect("write");
    thaifood(temp.path())
        .args(["search", "กะเพรา"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn interactive_answers_each_line_until_quit() {
    let temp = setup();
    thaifood(temp.path())
        .args(["interactive", "-n", "1"])
        .write_stdin("\nต้มยำ\n   \n:quit\nกะเพรา\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. ต้มยำกุ้ง"))
        .stdout(predicate::str::contains("ไก่ผัดกะเพรา").not());
}

#[test]
fn interactive_reload_rereads_the_corpus_file() {
    let temp = setup();
    let grown = CORPUS.trim_end().trim_end_matches(']').to_string()
        + r#", {"ชื่ออาหาร": "ข้าวซอยไก่", "วัตถุดิบ_ไม่มีปริมาณ": "บะหมี่ ไก่ กะทิ", "query1 อยากกินอาหารครบ": "อยากกินข้าวซอย"}]"#;
    fs::write(temp.path().join("thai_food.json"), grown).expect("grow corpus");

    thaifood(temp.path())
        .args(["interactive", "-n", "1"])
        .write_stdin(":reload\nข้าวซอย\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Reloaded 4 records"))
        .stdout(predicate::str::contains("1. ข้าวซอยไก่"));
}
