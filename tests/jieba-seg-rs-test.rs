use jieba_seg_rs::{
    keywords, CutMode, Dictionary, EngineConfig, IdfTable, Jieba, JiebaError, StopWords,
};

const TEST_DICT: &str = "\
研究 50 vn
研究生 20 n
生命 40 n
命 10 n
起源 30 n
生 15 v
的 500 uj
科学 40 n
重要 30 a
很 100 d
中国 80 ns
中国人 20 n
人 60 n
北京 70 ns
大学 60 n
北京大学 30 nt
我 200 r
来到 40 v
";

fn test_engine() -> Jieba {
    Jieba::with_dict(TEST_DICT.as_bytes()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dp_picks_the_most_probable_route() {
        let dict = "研究 5 n\n研 0 n\n生命 3 n\n生 0 n\n命 0 n\n";
        let jieba = Jieba::with_dict(dict.as_bytes()).unwrap();
        assert_eq!(jieba.dictionary().total_frequency(), 8.0);
        assert_eq!(
            jieba.cut("研究生命", CutMode::Accurate),
            vec!["研究", "生命"]
        );
    }

    #[test]
    fn accurate_cut_test() {
        let jieba = test_engine();
        assert_eq!(
            jieba.cut("我来到北京大学", CutMode::Accurate),
            vec!["我", "来到", "北京大学"]
        );
        assert_eq!(
            jieba.cut("我来到北京大学", CutMode::Default),
            jieba.cut("我来到北京大学", CutMode::Accurate)
        );
    }

    #[test]
    fn full_cut_test() {
        let jieba = test_engine();
        assert_eq!(
            jieba.cut("北京大学", CutMode::Full),
            vec!["北", "北京", "北京大学", "京", "大", "大学", "学"]
        );
    }

    #[test]
    fn search_cut_test() {
        let jieba = test_engine();
        assert_eq!(
            jieba.cut("北京大学", CutMode::Search),
            vec!["北京大学", "北京", "大学"]
        );
    }

    #[test]
    fn hmm_joins_unknown_characters() {
        let jieba = test_engine();
        assert_eq!(
            jieba.cut("我张三李四", CutMode::Accurate),
            vec!["我", "张三", "李四"]
        );
        assert_eq!(
            jieba.cut("我张三李四", CutMode::NoHmm),
            vec!["我", "张", "三", "李", "四"]
        );
    }

    #[test]
    fn non_chinese_runs_are_grouped_by_class() {
        let jieba = test_engine();
        assert_eq!(jieba.cut("abc123", CutMode::Accurate), vec!["abc", "123"]);
        assert_eq!(
            jieba.cut("Rust 2024!", CutMode::Full),
            vec!["Rust", " ", "2024", "!"]
        );
    }

    #[test]
    fn tokens_concatenate_to_the_input() {
        let jieba = test_engine();
        let input = "我来到北京大学，研究生命的起源。\nabc 123!张三李四";
        for mode in [CutMode::Default, CutMode::Accurate, CutMode::NoHmm] {
            assert_eq!(jieba.cut(input, mode).concat(), input, "mode {}", mode.name());
        }
        assert!(jieba.cut("", CutMode::Accurate).is_empty());
    }

    #[test]
    fn full_covers_nohmm_tokens() {
        let jieba = test_engine();
        let input = "我来到北京大学，研究生命的起源。";
        let full = jieba.cut(input, CutMode::Full);
        for token in jieba.cut(input, CutMode::NoHmm) {
            assert!(full.contains(&token), "{token} missing from full cut");
        }
    }

    #[test]
    fn parallel_cut_matches_sequential() {
        let input = "我来到北京大学，研究生命的起源。张三李四 abc123\n".repeat(40);
        let sequential = test_engine().with_parallel_threshold(usize::MAX);
        let parallel = test_engine().with_parallel_threshold(0);
        for mode in CutMode::ALL {
            assert_eq!(sequential.cut(&input, mode), parallel.cut(&input, mode));
        }
    }

    #[test]
    fn cut_and_join_test() {
        let jieba = test_engine();
        assert_eq!(
            jieba.cut_and_join("我来到北京大学", CutMode::Accurate, "/"),
            "我/来到/北京大学"
        );
    }

    #[test]
    fn extract_keywords_test() {
        let jieba = test_engine().with_stop_words(StopWords::new());
        assert_eq!(jieba.add_stop_word("的").unwrap(), false);
        assert_eq!(jieba.add_stop_word("的").unwrap(), true);
        let keywords = jieba.extract_keywords("的研究很重要", 5);
        assert!(!keywords.contains(&"的".to_owned()));
        assert_eq!(keywords, vec!["研究", "重要"]);
    }

    #[test]
    fn extract_keywords_weight_test() {
        let idf = IdfTable::from_reader("研究 2.0\n生命 6.0\n".as_bytes(), "idf").unwrap();
        let jieba = test_engine().with_idf_table(idf);
        let keywords = jieba.extract_keywords_weight("研究\n研究生命", 10);
        // newlines are removed before cutting: 研究 / 研究 / 生命
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].keyword, "生命");
        assert!((keywords[0].weight - 2.0).abs() < 1e-9);
        assert_eq!(keywords[1].keyword, "研究");
        assert!((keywords[1].weight - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn keyword_count_boundaries() {
        let jieba = test_engine();
        let input: Vec<String> = ('a'..='z').map(|c| format!("x{c}")).collect();
        let input = input.join(" ");
        assert_eq!(jieba.extract_keywords(&input, 0).len(), 20);
        assert_eq!(
            jieba.extract_keywords(&input, keywords::top_k_from_request(-5)).len(),
            20
        );
        assert_eq!(jieba.extract_keywords(&input, 1).len(), 1);
        assert_eq!(jieba.extract_keywords(&input, 26).len(), 26);
        assert_eq!(jieba.extract_keywords(&input, 100).len(), 26);
    }

    #[test]
    fn empty_dictionary_is_rejected() {
        assert!(matches!(
            Jieba::with_dict("".as_bytes()),
            Err(JiebaError::DictEmpty(_))
        ));
        assert!(matches!(
            Jieba::with_dict("研 0 n\n".as_bytes()),
            Err(JiebaError::DictEmpty(_))
        ));
    }

    #[test]
    fn add_dict_word_appends_once() {
        let dir = tempfile::tempdir().unwrap();
        let user_dict = dir.path().join("user.dict.txt");
        let jieba = test_engine().with_user_dict(&user_dict).unwrap();

        assert_eq!(jieba.add_dict_word("测试", 100, "n").unwrap(), false);
        assert_eq!(jieba.add_dict_word("测试", 100, "n").unwrap(), true);
        assert_eq!(fs::read_to_string(&user_dict).unwrap(), "测试 100 n\n");
        assert_eq!(jieba.dictionary().lookup("测试"), Some(100));
    }

    #[test]
    fn add_dict_word_terminates_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let user_dict = dir.path().join("user.dict.txt");
        fs::write(&user_dict, "已有 10 n").unwrap();

        let jieba = test_engine().with_user_dict(&user_dict).unwrap();
        assert!(jieba.dictionary().exists("已有"));
        assert_eq!(jieba.add_dict_word("测试", 100, "n").unwrap(), false);
        assert_eq!(
            fs::read_to_string(&user_dict).unwrap(),
            "已有 10 n\n测试 100 n\n"
        );
    }

    #[test]
    fn added_word_is_segmentable() {
        let jieba = test_engine();
        let before = jieba.dictionary().total_frequency();
        assert_eq!(jieba.add_dict_word("区块链", 10, "n").unwrap(), false);
        assert_eq!(jieba.dictionary().total_frequency(), before + 10.0);
        assert_eq!(jieba.dictionary().lookup("区块"), Some(0));
        assert_eq!(jieba.dictionary().lookup("区"), Some(0));
        assert_eq!(jieba.cut("区块链", CutMode::NoHmm), vec!["区块链"]);
        // a prefix placeholder already counts as existing
        assert_eq!(jieba.add_dict_word("区块", 5, "n").unwrap(), true);
    }

    #[test]
    fn lookups_ignore_case() {
        let jieba = Jieba::with_dict("iPhone 30 n\n研究 5 n\n".as_bytes()).unwrap();
        assert!(jieba.dictionary().exists("IPHONE"));
        assert_eq!(jieba.dictionary().lookup("iphone"), Some(30));
    }

    #[test]
    fn config_loads_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let dict_path = dir.path().join("dict.txt.zst");
        fs::write(&dict_path, zstd::encode_all(TEST_DICT.as_bytes(), 0).unwrap()).unwrap();
        let idf_path = dir.path().join("idf.txt");
        fs::write(&idf_path, "研究 2.0\n重要 8.0\n").unwrap();

        let config_path = dir.path().join("config.json");
        let json = serde_json::json!({
            "dict_path": dict_path,
            "user_dict_path": dir.path().join("missing.user.txt"),
            "idf_path": idf_path,
            "stop_words_path": dir.path().join("stop_words.txt"),
        });
        fs::write(&config_path, json.to_string()).unwrap();

        let config = EngineConfig::from_json_file(&config_path).unwrap();
        assert!(config.default_stop_words);
        let jieba = Jieba::from_config(&config).unwrap();
        assert_eq!(
            jieba.cut("我来到北京大学", CutMode::Accurate),
            vec!["我", "来到", "北京大学"]
        );
        assert_eq!(jieba.extract_keywords("研究很重要", 5), vec!["重要", "研究"]);
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"dict_path": "d.txt", "dict_pth": "x"}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(&config_path),
            Err(JiebaError::ConfigLoad { .. })
        ));
    }

    #[test]
    fn missing_standard_dictionary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path().join("nope.txt"));
        assert!(matches!(
            Jieba::from_config(&config),
            Err(JiebaError::DictLoad { .. })
        ));
    }

    #[test]
    fn stop_words_persist_across_engines() {
        let dir = tempfile::tempdir().unwrap();
        let dict_path = dir.path().join("dict.txt");
        fs::write(&dict_path, TEST_DICT).unwrap();
        let stop_path = dir.path().join("stop_words.txt");
        let config = EngineConfig::new(&dict_path)
            .stop_words(&stop_path)
            .default_stop_words(false);

        let jieba = Jieba::from_config(&config).unwrap();
        assert_eq!(jieba.add_stop_word("研究").unwrap(), false);
        assert_eq!(fs::read_to_string(&stop_path).unwrap(), "研究\n");

        let reloaded = Jieba::from_config(&config).unwrap();
        assert_eq!(reloaded.add_stop_word("研究").unwrap(), true);
        assert_eq!(reloaded.extract_keywords("研究很重要", 5), vec!["重要"]);
    }

    #[test]
    fn bulk_load_skips_malformed_lines() {
        let dict = "研究 abc n\n生命 3\n\n生命 3 n x\n科学 4 n\n";
        let dictionary = Dictionary::from_reader(dict.as_bytes(), "dict").unwrap();
        // a non-integer frequency loads as a zero-frequency entry
        assert_eq!(dictionary.lookup("研究"), Some(0));
        assert_eq!(dictionary.lookup("研"), Some(0));
        // two and four fields are skipped
        assert_eq!(dictionary.lookup("生命"), None);
        assert!(!dictionary.exists("生"));
        assert_eq!(dictionary.lookup("科学"), Some(4));
        assert_eq!(dictionary.lookup("科"), Some(0));
        assert_eq!(dictionary.total_frequency(), 4.0);
        assert_eq!(dictionary.len(), 4);
    }

    #[test]
    fn invalid_utf8_lines_are_skipped() {
        let mut bytes = b"\xff\xfe 5 n\n".to_vec();
        bytes.extend_from_slice("研究 5 n\n生命 3 n".as_bytes());
        let dictionary = Dictionary::from_reader(bytes.as_slice(), "dict").unwrap();
        assert_eq!(dictionary.lookup("研究"), Some(5));
        assert_eq!(dictionary.lookup("生命"), Some(3));
        assert_eq!(dictionary.total_frequency(), 8.0);

        let mut bytes = "研究 2.0\n".as_bytes().to_vec();
        bytes.extend_from_slice(b"\xc3\x28 9.0\n");
        bytes.extend_from_slice("生命 6.0\n".as_bytes());
        let idf = IdfTable::from_reader(bytes.as_slice(), "idf").unwrap();
        assert_eq!(idf.len(), 2);
        assert_eq!(idf.weight("生命"), 6.0);

        let mut bytes = b"\x80\n".to_vec();
        bytes.extend_from_slice("我们\r\n".as_bytes());
        let stop_words = StopWords::new();
        stop_words.load_reader(bytes.as_slice(), "stop").unwrap();
        assert_eq!(stop_words.len(), 1);
        assert!(stop_words.contains("我们"));
    }

    #[test]
    fn unreadable_user_dictionary_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            test_engine().with_user_dict(dir.path()),
            Err(JiebaError::DictLoad { .. })
        ));

        let dict_path = dir.path().join("dict.txt");
        fs::write(&dict_path, TEST_DICT).unwrap();
        let user_dict = dir.path().join("user.dict.txt.zst");
        fs::write(&user_dict, "not zstd data").unwrap();
        let config = EngineConfig::new(&dict_path).user_dict(&user_dict);
        assert!(matches!(
            Jieba::from_config(&config),
            Err(JiebaError::DictLoad { .. })
        ));
    }

    #[test]
    fn compressed_files_are_not_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let user_dict = dir.path().join("user.dict.txt.zst");
        let stop_path = dir.path().join("stop_words.txt.zst");
        let jieba = test_engine()
            .with_user_dict(&user_dict)
            .unwrap()
            .with_stop_words_file(&stop_path)
            .unwrap();

        assert!(matches!(
            jieba.add_dict_word("测试", 100, "n"),
            Err(JiebaError::DictWrite { .. })
        ));
        assert!(!jieba.dictionary().exists("测试"));
        assert!(!user_dict.exists());

        assert!(matches!(
            jieba.add_stop_word("测试"),
            Err(JiebaError::DictWrite { .. })
        ));
        assert!(!stop_path.exists());
    }
}
