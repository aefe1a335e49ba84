use assert_matches::assert_matches;

use count_harmonizer::domain::{FileId, FormatVariant, SampleId, coerce_count, is_summary_gene};
use count_harmonizer::error::HarmonizeError;

#[test]
fn parse_identifiers_trim() {
    let id: FileId = " uuid-1 ".parse().unwrap();
    assert_eq!(id.as_str(), "uuid-1");
    let sample: SampleId = "TCGA-A1-01A".parse().unwrap();
    assert_eq!(sample.to_string(), "TCGA-A1-01A");
}

#[test]
fn empty_identifiers_are_rejected() {
    let err = "  ".parse::<SampleId>().unwrap_err();
    assert_matches!(err, HarmonizeError::InvalidIdentifier(_));
}

#[test]
fn format_variant_names_round_trip() {
    for variant in [FormatVariant::StarGeneCounts, FormatVariant::AnnotatedTable] {
        assert_eq!(variant.to_string().parse::<FormatVariant>().unwrap(), variant);
    }
    assert_matches!(
        "bam".parse::<FormatVariant>(),
        Err(HarmonizeError::InvalidFormatVariant(_))
    );
}

#[test]
fn format_variant_serializes_snake_case() {
    let json = serde_json::to_string(&FormatVariant::StarGeneCounts).unwrap();
    assert_eq!(json, "\"star_gene_counts\"");
}

#[test]
fn non_numeric_counts_coerce_to_zero() {
    for value in ["", "NA", "n/a", "1,000", "inf", "-1"] {
        assert_eq!(coerce_count(value), 0.0, "value {value:?}");
    }
    assert_eq!(coerce_count("1e3"), 1000.0);
}

#[test]
fn summary_prefixes() {
    assert!(is_summary_gene("__no_feature"));
    assert!(is_summary_gene("N_ambiguous"));
    assert!(!is_summary_gene("ENSG00000141510"));
    assert!(!is_summary_gene("n_lowercase"));
}
