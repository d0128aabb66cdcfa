use fuzzy_rerere_core::conflict::matcher::sequence_ratio;
use fuzzy_rerere_core::conflict::{
    split_lines, ConflictExtractor, ContextSimilarityMatcher, Reapplier, ResolutionReconstructor,
    OPENING_MARKER,
};
use fuzzy_rerere_core::store::RecordStore;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Segment {
    Line(String),
    Conflict { ours: Vec<String>, theirs: Vec<String> },
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        3 => "[a-z ]{0,8}".prop_map(Segment::Line),
        1 => (
            prop::collection::vec("[a-z]{1,6}", 0..3),
            prop::collection::vec("[a-z]{1,6}", 0..3),
        )
            .prop_map(|(ours, theirs)| Segment::Conflict { ours, theirs }),
    ]
}

/// Render segments as file content, returning it and the number of conflicts.
fn render(segments: &[Segment]) -> (String, usize) {
    let mut content = String::new();
    let mut conflicts = 0;
    for segment in segments {
        match segment {
            Segment::Line(line) => {
                content.push_str(line);
                content.push('\n');
            }
            Segment::Conflict { ours, theirs } => {
                conflicts += 1;
                content.push_str("<<<<<<< ours\n");
                for line in ours {
                    content.push_str(line);
                    content.push('\n');
                }
                content.push_str("=======\n");
                for line in theirs {
                    content.push_str(line);
                    content.push('\n');
                }
                content.push_str(">>>>>>> theirs\n");
            }
        }
    }
    (content, conflicts)
}

fn numbered(prefix: &str, count: usize) -> String {
    (0..count).map(|i| format!("{}{}\n", prefix, i)).collect()
}

proptest! {
    #[test]
    fn test_extraction_finds_every_conflict(
        segments in prop::collection::vec(segment(), 0..20),
        context_lines in 0usize..4,
    ) {
        let (content, conflicts) = render(&segments);
        let extractor = ConflictExtractor::new(context_lines);
        let regions = extractor.extract(&content, "f.txt");
        prop_assert_eq!(regions.len(), conflicts);

        // Extracting the same content again yields the same regions.
        prop_assert_eq!(&regions, &extractor.extract(&content, "f.txt"));

        let lines = split_lines(&content);
        for region in &regions {
            let body: String = lines[region.start_line..=region.end_line].concat();
            prop_assert_eq!(&body, &region.conflict_text);
        }
    }

    #[test]
    fn test_context_is_bounded(
        segments in prop::collection::vec(segment(), 0..20),
        context_lines in 0usize..4,
    ) {
        let (content, _) = render(&segments);
        for region in ConflictExtractor::new(context_lines).extract(&content, "f.txt") {
            prop_assert!(split_lines(&region.before_context).len() <= context_lines);
            prop_assert!(split_lines(&region.after_context).len() <= context_lines);
            prop_assert!(!region.after_context.contains(OPENING_MARKER));
        }
    }

    #[test]
    fn test_sequence_ratio_is_symmetric_and_bounded(a in ".{0,40}", b in ".{0,40}") {
        let ab = sequence_ratio(&a, &b);
        prop_assert_eq!(ab, sequence_ratio(&b, &a));
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(sequence_ratio(&a, &a), 1.0);
    }

    #[test]
    fn test_reconstruction_recovers_resolution(
        head in 0usize..4,
        tail in 0usize..6,
        resolution in prop::collection::vec("[A-Z]{1,6}", 0..6),
    ) {
        let resolution: String = resolution.iter().map(|l| format!("{}\n", l)).collect();
        let pre = format!(
            "{}<<<<<<<\nours\n=======\ntheirs\n>>>>>>>\n{}",
            numbered("head", head),
            numbered("tail", tail),
        );
        let post = format!("{}{}{}", numbered("head", head), resolution, numbered("tail", tail));

        let regions = ConflictExtractor::new(2).extract(&pre, "f.txt");
        let result = ResolutionReconstructor::new(3).reconstruct_all(&pre, &post, &regions);
        prop_assert_eq!(&result.resolutions, &vec![resolution.clone()]);
        prop_assert_eq!(
            result.line_delta,
            split_lines(&resolution).len() as isize - 5
        );
    }

    #[test]
    fn test_reapply_without_records_is_identity(
        segments in prop::collection::vec(segment(), 0..12),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let (content, _) = render(&segments);
        let regions = ConflictExtractor::new(2).extract(&content, "f.txt");

        let result = Reapplier::new(&store, ContextSimilarityMatcher::new(0.0))
            .reapply(&content, &regions)
            .unwrap();
        prop_assert_eq!(&result.updated, &content);
        prop_assert_eq!(result.unmatched.len(), regions.len());
    }
}
