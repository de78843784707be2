use super::*;

fn passages(texts: &[&str]) -> Vec<Passage> {
    texts.iter().map(|t| Passage::new("Topic", *t)).collect()
}

#[test]
fn test_bm25_prefers_matching_passage() {
    let docs = passages(&[
        "Grass appears green because of chlorophyll.",
        "The sky appears blue due to Rayleigh scattering.",
        "Bananas are yellow when ripe.",
    ]);
    let index = Bm25Index::build(&docs);

    let scores = index.score_text("Color The sky is blue");
    let best = top_k(&scores, 1, ScoreOrder::HigherIsBetter);

    assert_eq!(best[0].0, 1);
    assert!(best[0].1 > 0.0);
}

#[test]
fn test_bm25_single_passage_scores_positive() {
    let index = Bm25Index::build(&passages(&["The sky appears blue."]));
    let scores = index.score_text("sky");

    assert_eq!(scores.len(), 1);
    assert!(scores[0] > 0.0);
}

#[test]
fn test_bm25_empty_index() {
    let index = Bm25Index::build(&[]);

    assert!(index.is_empty());
    assert!(index.score_text("anything").is_empty());
    assert!(top_k(&index.score_text("anything"), 5, ScoreOrder::HigherIsBetter).is_empty());
}

#[test]
fn test_bm25_build_is_deterministic() {
    let docs = passages(&["alpha beta", "beta gamma", "gamma delta"]);
    assert_eq!(Bm25Index::build(&docs), Bm25Index::build(&docs));
}

#[test]
fn test_top_k_lower_is_better() {
    let scores = [0.9, 0.1, 0.5];
    let ranked = top_k(&scores, 2, ScoreOrder::LowerIsBetter);

    assert_eq!(ranked.iter().map(|r| r.0).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn test_top_k_ties_keep_passage_order() {
    let scores = [1.0, 2.0, 2.0, 1.0];
    let ranked = top_k(&scores, 4, ScoreOrder::HigherIsBetter);

    assert_eq!(
        ranked.iter().map(|r| r.0).collect::<Vec<_>>(),
        vec![1, 2, 0, 3]
    );
}

#[test]
fn test_hashing_embedder_similarity() {
    let embedder = HashingEmbedder::default();
    let docs = passages(&[
        "The sky appears blue due to Rayleigh scattering.",
        "Chlorophyll makes leaves green.",
    ]);
    let index = VectorIndex::build(&docs, &embedder, VectorMetric::Cosine).unwrap();

    let scores = index.score("sky blue Rayleigh", &embedder).unwrap();
    assert!(scores[0] > scores[1]);
}

#[test]
fn test_vector_l2_lower_is_better() {
    let embedder = HashingEmbedder::default();
    let docs = passages(&["sky blue", "leaves green chlorophyll"]);
    let index = VectorIndex::build(&docs, &embedder, VectorMetric::L2).unwrap();

    let scores = index.score("sky blue", &embedder).unwrap();
    let kind = IndexKind::Vector(VectorMetric::L2);
    let best = top_k(&scores, 1, kind.score_order());

    assert_eq!(best[0].0, 0);
    assert!(scores[0] < scores[1]);
}

#[test]
fn test_vector_index_empty() {
    let embedder = HashingEmbedder::default();
    let index = VectorIndex::build(&[], &embedder, VectorMetric::Cosine).unwrap();

    assert!(index.is_empty());
    assert!(index.score("query", &embedder).unwrap().is_empty());
}

#[test]
fn test_vector_index_requires_embedder() {
    let docs = passages(&["text"]);
    let result = TopicIndex::build(IndexKind::Vector(VectorMetric::Cosine), &docs, None);

    assert!(matches!(result, Err(IndexError::MissingEmbedder)));
}

#[test]
fn test_vector_dimension_mismatch() {
    let docs = passages(&["text"]);
    let small = HashingEmbedder::new(8).unwrap();
    let large = HashingEmbedder::new(16).unwrap();
    let index = VectorIndex::build(&docs, &small, VectorMetric::Cosine).unwrap();

    assert!(matches!(
        index.score("text", &large),
        Err(IndexError::DimensionMismatch {
            expected: 8,
            actual: 16
        })
    ));
}

#[test]
fn test_hashing_embedder_zero_dim_rejected() {
    assert!(HashingEmbedder::new(0).is_err());
}

#[test]
fn test_topic_index_serde_roundtrip() {
    let docs = passages(&["alpha beta", "beta gamma"]);
    let index = TopicIndex::build(IndexKind::Bm25, &docs, None).unwrap();

    let json = serde_json::to_string(&index).unwrap();
    let restored: TopicIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(index, restored);
}

#[test]
fn test_index_kind_parse_and_order() {
    assert_eq!("bm25".parse::<IndexKind>().unwrap(), IndexKind::Bm25);
    assert_eq!(
        "vector".parse::<IndexKind>().unwrap(),
        IndexKind::Vector(VectorMetric::Cosine)
    );
    assert!("sparse".parse::<IndexKind>().is_err());

    assert_eq!(IndexKind::Bm25.score_order(), ScoreOrder::HigherIsBetter);
    assert_eq!(
        IndexKind::Vector(VectorMetric::L2).score_order(),
        ScoreOrder::LowerIsBetter
    );
}
