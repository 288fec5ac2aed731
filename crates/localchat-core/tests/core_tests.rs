use std::fs;
use std::io::Write;
use tempfile::TempDir;

use figment::Jail;
use localchat_core::config::{DocFrequency, Settings, StopWords};
use localchat_core::loader::DocumentLoader;

#[test]
fn scan_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let mut f = fs::File::create(dir.join("a.txt")).unwrap();
    writeln!(f, "Short text").unwrap();

    let units = DocumentLoader::default().scan(dir);

    assert_eq!(units.len(), 1, "one small paragraph becomes one unit");
    assert_eq!(units[0].id, "a.txt#p1");
    assert_eq!(units[0].text, "Short text");
}

#[test]
fn scan_missing_directory_is_empty() {
    let tmp = TempDir::new().unwrap();
    let units = DocumentLoader::default().scan(&tmp.path().join("does-not-exist"));
    assert!(units.is_empty());
}

#[test]
fn scan_splits_on_blank_line_runs() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("notes.md"), "A\n\nB\n\n\nC").unwrap();

    let units = DocumentLoader::default().scan(tmp.path());
    let pairs: Vec<(&str, &str)> = units.iter().map(|u| (u.id.as_str(), u.text.as_str())).collect();
    assert_eq!(pairs, [("notes.md#p1", "A"), ("notes.md#p2", "B"), ("notes.md#p3", "C")]);
}

#[test]
fn scan_filters_extensions_case_insensitively_and_recurses() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested/deeper")).unwrap();
    fs::write(dir.join("UPPER.TXT"), "upper").unwrap();
    fs::write(dir.join("nested/readme.Md"), "markdown").unwrap();
    fs::write(dir.join("nested/deeper/plain.txt"), "deep").unwrap();
    fs::write(dir.join("image.png"), "not text").unwrap();
    fs::write(dir.join("data.json"), "{}").unwrap();

    let units = DocumentLoader::default().scan(dir);
    let mut ids: Vec<&str> = units.iter().map(|u| u.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["UPPER.TXT#p1", "plain.txt#p1", "readme.Md#p1"]);
}

#[test]
fn scan_replaces_undecodable_bytes() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bin.txt"), b"caf\xff latte\n\nsecond").unwrap();

    let units = DocumentLoader::default().scan(tmp.path());
    assert_eq!(units.len(), 2);
    assert!(units[0].text.starts_with("caf"));
    assert!(units[0].text.ends_with("latte"));
    assert_eq!(units[1].id, "bin.txt#p2");
}

#[test]
fn scan_order_is_stable_across_runs() {
    let tmp = TempDir::new().unwrap();
    for name in ["c.txt", "a.txt", "b.md"] {
        fs::write(tmp.path().join(name), format!("{name} one\n\n{name} two")).unwrap();
    }
    let loader = DocumentLoader::default();
    let first = loader.scan(tmp.path());
    let second = loader.scan(tmp.path());
    assert_eq!(first, second);
    assert_eq!(first[0].id, "a.txt#p1");
    assert_eq!(first.len(), 6);
}

#[test]
fn custom_extensions_accept_leading_dot() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("page.rst"), "restructured").unwrap();
    fs::write(tmp.path().join("note.txt"), "plain").unwrap();

    let units = DocumentLoader::new([".RST"]).scan(tmp.path());
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].id, "page.rst#p1");
}

#[test]
fn scan_skips_unreadable_files_and_continues() {
    let tmp = TempDir::new().unwrap();
    let good = tmp.path().join("good.txt");
    fs::write(&good, "Still here.").unwrap();
    let files = vec![tmp.path().join("vanished.txt"), tmp.path().join("folder.md"), good];
    fs::create_dir(tmp.path().join("folder.md")).unwrap();

    let units = DocumentLoader::default().scan_files(&files);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].id, "good.txt#p1");
    assert_eq!(units[0].text, "Still here.");
}

#[cfg(unix)]
#[test]
fn scan_follows_symlinked_documents() {
    let tmp = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    fs::write(tmp.path().join("plain.txt"), "Plain file.").unwrap();
    fs::write(outside.path().join("real.txt"), "Linked file.").unwrap();
    std::os::unix::fs::symlink(outside.path().join("real.txt"), tmp.path().join("link.txt")).unwrap();
    std::os::unix::fs::symlink(outside.path().join("gone.txt"), tmp.path().join("dangling.txt")).unwrap();

    let units = DocumentLoader::default().scan(tmp.path());
    let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();

    assert_eq!(ids, ["link.txt#p1", "plain.txt#p1"]);
    assert_eq!(units[0].text, "Linked file.");
}

#[test]
fn settings_defaults() {
    let s = Settings::default();
    assert_eq!(s.rag.top_k, 4);
    assert_eq!(s.rag.preview_chars, 200);
    assert_eq!(s.tfidf.ngram_range, (1, 2));
    assert_eq!(s.tfidf.max_df, DocFrequency::Proportion(0.9));
    assert_eq!(s.tfidf.min_df, DocFrequency::Count(1));
    assert_eq!(s.llm.provider, "openai");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_merge_toml_overlay_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
                [rag]
                docs_dir = "corpus"
                top_k = 6

                [tfidf]
                max_df = 3
                stop_words = "english"
            "#,
        )?;
        jail.create_file("config.test.toml", "[tfidf]\nmin_df = 0.1\n")?;
        jail.set_env("LOCALCHAT_LLM__PROVIDER", "ollama");

        let s = Settings::load_for_env("test").map_err(|e| e.to_string())?;
        assert_eq!(s.rag.docs_dir, std::path::PathBuf::from("corpus"));
        assert_eq!(s.rag.top_k, 6);
        assert_eq!(s.tfidf.max_df, DocFrequency::Count(3));
        assert_eq!(s.tfidf.min_df, DocFrequency::Proportion(0.1));
        assert_eq!(s.tfidf.stop_words, StopWords::English);
        assert_eq!(s.llm.provider, "ollama");
        assert_eq!(s.llm.ollama_model, "llama3.1", "untouched keys keep defaults");
        Ok(())
    });
}

#[test]
fn settings_reject_bad_ngram_range() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[tfidf]\nngram_range = [2, 1]\n")?;
        assert!(Settings::load_for_env("prod").is_err());
        Ok(())
    });
}

#[test]
fn settings_reject_oversized_ngram_range() {
    let mut s = Settings::default();
    s.tfidf.ngram_range = (1, localchat_core::config::MAX_NGRAM + 1);
    assert!(s.validate().is_err());
    s.tfidf.ngram_range = (1, localchat_core::config::MAX_NGRAM);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_reject_out_of_range_proportion() {
    let mut s = Settings::default();
    s.tfidf.max_df = DocFrequency::Proportion(1.5);
    assert!(s.validate().is_err());
}

#[test]
fn resolve_paths_anchors_relative_entries() {
    let mut s = Settings::default();
    s.resolve_paths(std::path::Path::new("/srv/chat"));
    assert_eq!(s.rag.docs_dir, std::path::PathBuf::from("/srv/chat/data/docs"));
    assert_eq!(s.chat.memory_path, std::path::PathBuf::from("/srv/chat/memory.json"));
}
