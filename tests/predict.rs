use ::std::{fs, io::Write, path::PathBuf, sync::LazyLock, thread};
use float_cmp::approx_eq;
use ngram_trie::{load_model, LoadError, Model, ModelLoader, ModelStats, MODEL_PATH_VAR};
use rstest::*;

const TOY_ARPA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/toy.arpa");

static TOY_MODEL: LazyLock<Model> = LazyLock::new(|| load_model(TOY_ARPA, None).unwrap());

const ALL_AFTER_E_QUE: &[&str] = &[
    "os",
    "levaram",
    "já",
    "avançaram",
    "que",
    "é",
    "</s>",
    "mais",
    "para",
    "<unk>",
    "havia",
    "dentro",
    "<s>",
];

const ALL_UNIGRAMS: &[&str] = &[
    "que",
    "é",
    "os",
    "</s>",
    "mais",
    "para",
    "<unk>",
    "levaram",
    "já",
    "avançaram",
    "havia",
    "dentro",
    "<s>",
];

#[rstest(
    context,
    k,
    expected,
    case::full_context(vec!["PAra", "é"], 1, vec!["que"]),
    case::bigram(vec!["que"], 1, vec!["os"]),
    case::trigram_beats_backoff(vec!["havia", "é"], 1, vec!["que"]),
    case::top_three(vec!["é", "que"], 3, vec!["os", "levaram", "já"]),
    case::sentence_start(vec!["<s>", "para"], 1, vec!["é"]),
    case::empty_context(vec![], 1, vec!["que"]),
    case::unknown_word(vec!["xyzzy"], 2, vec!["que", "é"]),
    case::truncated(vec!["havia", "para", "é"], 2, vec!["que", "mais"]),
    case::zero(vec!["é", "que"], 0, vec![]),
)]
fn test_predict(context: Vec<&str>, k: usize, expected: Vec<&str>) {
    assert_eq!(TOY_MODEL.predict(&context, k), expected);
}

#[rstest(
    context,
    expected,
    case::all_after_context(vec!["é", "que"], ALL_AFTER_E_QUE),
    case::ties_by_word_id(vec![], ALL_UNIGRAMS),
)]
fn test_predict_whole_vocabulary(context: Vec<&str>, expected: &[&str]) {
    assert_eq!(TOY_MODEL.predict(&context, 13), expected);
    // no more candidates than words
    assert_eq!(TOY_MODEL.predict(&context, 100), expected);
}

#[rstest(
    context,
    expected_len,
    case(vec!["é", "que"], 2),
    case(vec!["havia", "é", "que"], 2),
    case(vec!["para", "é"], 2),
    case(vec!["levaram", "é"], 1),
    case(vec!["xyzzy"], 1),
    case(vec![], 0),
)]
fn test_longest_context(context: Vec<&str>, expected_len: usize) {
    assert_eq!(TOY_MODEL.longest_context(&context), expected_len);
}

#[test]
fn test_stats() {
    assert_eq!(
        TOY_MODEL.stats(),
        ModelStats {
            max_order: 3,
            // `Que` collapses into `que`
            vocabulary_size: 13,
            ngram_counts: vec![13, 13, 7],
            implicit_nodes: 0,
        }
    );
}

#[test]
fn test_word_ids_are_dense() {
    let vocabulary = TOY_MODEL.vocabulary();
    for (id, word) in vocabulary.iter() {
        assert_eq!(TOY_MODEL.word_id(word), Some(id));
        assert_eq!(TOY_MODEL.word(id), Some(word));
    }
    assert_eq!(vocabulary.iter().count(), vocabulary.len());
    assert_eq!(TOY_MODEL.word_id("Avançaram"), Some(11));
    assert_eq!(TOY_MODEL.word(13), None);
}

#[test]
fn test_scores_are_sorted() {
    let scored = TOY_MODEL.predictor().predict_scored(&["é", "que"], 13);
    assert!(scored.windows(2).all(|pair| pair[0].1 >= pair[1].1));
    assert!(approx_eq!(f32, scored[0].1, -0.2));
    // `que` after `é que` pays both backoff weights
    assert!(approx_eq!(f32, scored[4].1, -0.5 + -0.35 + -1.2, epsilon = 1e-6));
}

#[test]
fn test_max_order_truncates_context() {
    let model = ModelLoader::new().max_order(2).load_path(TOY_ARPA).unwrap();
    assert_eq!(model.max_order(), 2);
    assert_eq!(model.stats().ngram_counts, vec![13, 13]);
    // only `é` is used, `é que` would need trigrams
    assert_eq!(model.predict(&["havia", "é"], 2), ["que", "mais"]);
    assert_eq!(model.longest_context(&["havia", "é"]), 1);
}

#[test]
fn test_loading_is_deterministic() {
    let model = load_model(TOY_ARPA, None).unwrap();
    assert_eq!(model.stats(), TOY_MODEL.stats());
    for context in [vec![], vec!["que"], vec!["é", "que"], vec!["para", "é"]] {
        assert_eq!(model.predict(&context, 13), TOY_MODEL.predict(&context, 13));
    }
}

#[test]
fn test_model_without_unknown_word() {
    let text = fs::read_to_string(TOY_ARPA)
        .unwrap()
        .replace("ngram 1=14", "ngram 1=13")
        .replace("-2.0\t<unk>\t0\n", "");
    let model = Model::from_arpa_str(&text, None).unwrap();
    assert_eq!(model.word_id("<unk>"), None);
    // the unknown word resets the context, `é` alone remains
    assert_eq!(model.predict(&["é", "xyzzy"], 1), ["que"]);
    assert_eq!(model.predict(&["xyzzy", "é"], 2), ["que", "mais"]);
}

#[test]
fn test_load_compressed() {
    let path: PathBuf =
        ::std::env::temp_dir().join(format!("ngram_trie_toy_{}.arpa.br", ::std::process::id()));
    {
        let file = fs::File::create(&path).unwrap();
        let mut writer = brotli::CompressorWriter::new(file, 4096, 9, 22);
        writer.write_all(&fs::read(TOY_ARPA).unwrap()).unwrap();
    }
    let model = load_model(&path, None);
    fs::remove_file(&path).unwrap();

    let model = model.unwrap();
    assert_eq!(model.stats(), TOY_MODEL.stats());
    assert_eq!(model.predict(&["é", "que"], 3), ["os", "levaram", "já"]);
}

#[test]
fn test_load_from_env() {
    ::std::env::set_var(MODEL_PATH_VAR, TOY_ARPA);
    let model = ModelLoader::new().load_from_env().unwrap();
    ::std::env::remove_var(MODEL_PATH_VAR);
    assert_eq!(model.stats(), TOY_MODEL.stats());
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        load_model("tests/data/missing.arpa", None),
        Err(LoadError::Open { .. })
    ));
}

#[test]
fn test_concurrent_queries() {
    let contexts: Vec<Vec<&str>> = vec![
        vec![],
        vec!["que"],
        vec!["é", "que"],
        vec!["havia", "é"],
        vec!["xyzzy", "para", "é"],
    ];
    let sequential: Vec<_> = contexts.iter().map(|c| TOY_MODEL.predict(c, 5)).collect();

    assert_eq!(TOY_MODEL.predict_batch(&contexts, 5), sequential);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    contexts
                        .iter()
                        .map(|c| TOY_MODEL.predict(c, 5))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), sequential);
        }
    });
}
