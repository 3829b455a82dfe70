use std::fs;

use tweet_topics::analysis;
use tweet_topics::corpus::{merge_documents, read_documents};
use tweet_topics::{Corpus, Hierarchy, InferenceConfig, ModelConfig, Tokenizer, TrainedModel};

fn tweets() -> Vec<String> {
    let mut docs = Vec::new();
    for i in 0..6 {
        docs.push(format!("RT @fan{i}: Huge #football match tonight, the league title goal http://bit.ly/x"));
        docs.push(format!("New #coffee roast {i}: espresso beans with crema https://t.co/abc"));
        docs.push("Election debate tonight: the senate vote and the campaign".to_string());
    }
    docs
}

fn config() -> ModelConfig {
    ModelConfig {
        num_topics: 3,
        num_iterations: 120,
        num_words: 5,
        top_topics: 2,
        inference: InferenceConfig {
            iterations: 100,
            thinning: 1,
            burn_in: 5,
        },
        ..ModelConfig::default()
    }
}

#[test]
fn test_pets_example_totals() {
    let tokenizer = Tokenizer::new();
    let corpus = Corpus::from_texts(&["cat dog cat", "dog fish dog"], &tokenizer);
    let model = tweet_topics::train(&corpus, &ModelConfig::new(2)).unwrap();
    let totals = model.state().topic_totals();
    assert_eq!(totals[0] + totals[1], 6);
    model.state().check_against(corpus.documents()).unwrap();
}

#[test]
fn test_stop_words_only_document_is_empty() {
    assert!(Tokenizer::new().tokens("the the the").is_empty());
}

#[test]
fn test_noise_tokens_are_dropped() {
    let tokens = Tokenizer::new().tokens("RT check http://bit.ly/abc #rustlang");
    assert_eq!(tokens, vec!["check", "abc", "#rustlang"]);
}

#[test]
fn test_full_pipeline_writes_reports() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("someuser.txt");
    fs::write(&input, tweets().join("\n")).unwrap();

    let docs = read_documents(&input).unwrap();
    let analysis = analysis::run(&docs, None, &config()).unwrap();
    let paths = analysis.write_reports(dir.path(), "someuser", 5, true).unwrap();

    let top_words = fs::read_to_string(&paths.top_words).unwrap();
    assert_eq!(top_words.matches("Topic ").count(), 3);
    assert!(top_words.starts_with("Topic 0\n"));
    assert!(!top_words.contains("http"));
    assert!(!top_words.contains("rt:"));

    let composition = fs::read_to_string(&paths.composition).unwrap();
    let probabilities: Vec<f64> = composition
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let (topic, p) = line.split_once('\t').unwrap();
            assert_eq!(topic.parse::<usize>().unwrap(), i);
            p.parse().unwrap()
        })
        .collect();
    assert_eq!(probabilities.len(), 3);
    assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    let ranked = fs::read_to_string(&paths.ranked).unwrap();
    assert_eq!(ranked.lines().filter(|l| l.starts_with("Topic ")).count(), 2);

    let hierarchy: Hierarchy = serde_json::from_str(&fs::read_to_string(&paths.hierarchy).unwrap()).unwrap();
    assert_eq!(hierarchy.name, "");
    assert_eq!(hierarchy.children.len(), 2);
    for (node, score) in hierarchy.children.iter().zip(&analysis.ranking) {
        let words = &analysis.model.sorted_words()[score.topic];
        assert_eq!(node.name, words.first().map(|w| w.word.as_str()).unwrap_or(""));
        assert!(node.children.len() <= 5);
    }
}

#[test]
fn test_merged_defaults_to_joined_documents() {
    let docs = tweets();
    let merged = merge_documents(&docs);
    let a = analysis::run(&docs, None, &config()).unwrap();
    let b = analysis::run(&docs, Some(merged.as_str()), &config()).unwrap();
    assert_eq!(a.distribution, b.distribution);
}

#[test]
fn test_saved_model_reproduces_inference() {
    let dir = tempfile::tempdir().unwrap();
    let docs = tweets();
    let config = config();
    let trained = analysis::run(&docs, None, &config).unwrap();

    let model_path = dir.path().join("model.json");
    trained.model.save(&model_path).unwrap();
    let loaded = TrainedModel::load(&model_path).unwrap();
    assert_eq!(loaded.state(), trained.model.state());
    assert_eq!(loaded.sorted_words(), trained.model.sorted_words());

    let replay = analysis::analyze_with(
        loaded,
        &merge_documents(&docs),
        &analysis::tokenizer_for(&config),
        &config,
    )
    .unwrap();
    assert_eq!(replay.distribution, trained.distribution);
}

#[test]
fn test_yaml_config_drives_pipeline() {
    let yaml = "num_topics: 2\nnum_iterations: 30\ntop_topics: 5\ninference:\n  iterations: 20\n";
    let config = ModelConfig::from_yaml_str(yaml).unwrap();
    let analysis = analysis::run(&tweets(), None, &config).unwrap();
    assert_eq!(analysis.distribution.len(), 2);
    // k is clamped to the number of topics
    assert_eq!(analysis.ranking.len(), 2);
}
