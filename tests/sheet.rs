use camino::Utf8PathBuf;

use count_harmonizer::domain::{CountFile, SampleId};
use count_harmonizer::sheet::{IdentityMap, KeyRole, SampleSheet, SheetColumns};

fn identity(text: &str) -> IdentityMap {
    IdentityMap::from_sheet(&SampleSheet::from_reader(text.as_bytes()).unwrap())
}

fn sample(value: &str) -> Option<SampleId> {
    Some(value.parse().unwrap())
}

#[test]
fn gdc_sheet_resolves_every_file_id() {
    let map = identity(
        "File ID\tFile Name\tData Category\tProject ID\tCase ID\tSample ID\tSample Type\n\
uuid-1\ta.rna_seq.augmented_star_gene_counts.tsv\tTranscriptome Profiling\tTCGA-BRCA\tTCGA-A1\tTCGA-A1-01A\tPrimary Tumor\n\
uuid-2\tb.rna_seq.augmented_star_gene_counts.tsv\tTranscriptome Profiling\tTCGA-BRCA\tTCGA-A2\tTCGA-A2-11A\tSolid Tissue Normal\n",
    );
    assert_eq!(map.resolve("uuid-1"), sample("TCGA-A1-01A"));
    assert_eq!(map.resolve("uuid-2"), sample("TCGA-A2-11A"));
    assert_eq!(map.resolve("uuid-3"), None);
    let roles = map
        .candidates()
        .iter()
        .map(|candidate| candidate.role)
        .collect::<Vec<_>>();
    assert_eq!(roles, vec![KeyRole::FileId, KeyRole::FileName]);
}

#[test]
fn file_name_candidate_is_used_after_file_id() {
    let map = identity("file_name\tsample\ncounts_a.tsv\tS1\n");
    let file = CountFile::from_path(Utf8PathBuf::from("root/uuid-9/counts_a.tsv")).unwrap();
    assert_eq!(map.resolve_file(&file), sample("S1"));
}

#[test]
fn file_id_wins_over_file_name() {
    let map = identity("uuid\tfilename\tentity id\nuuid-1\tcounts.tsv\tS1\nuuid-2\tcounts.tsv\tS2\n");
    let file = CountFile::from_path(Utf8PathBuf::from("root/uuid-1/counts.tsv")).unwrap();
    assert_eq!(map.resolve_file(&file), sample("S1"));
}

#[test]
fn empty_sample_values_do_not_resolve() {
    let map = identity("File ID\tFile Name\tSample ID\nuuid-1\tcounts.tsv\t\n");
    assert_eq!(map.resolve("uuid-1"), None);
    assert_eq!(map.resolve("counts.tsv"), None);
}

#[test]
fn repeated_key_keeps_last_value() {
    let map = identity("file_id\tsample_id\nuuid-1\tS1\nuuid-1\tS2\n");
    assert_eq!(map.resolve("uuid-1"), sample("S2"));
}

#[test]
fn sheet_without_sample_column_has_no_candidates() {
    let map = identity("File ID\tFile Name\tCase ID\nuuid-1\tcounts.tsv\tC1\n");
    assert!(map.is_empty());
    assert_eq!(map.resolve("uuid-1"), None);
    assert_eq!(map.columns().sample_id, None);
}

#[test]
fn bom_and_short_rows_are_tolerated() {
    let sheet =
        SampleSheet::from_reader("\u{feff}File ID\tSample ID\nuuid-1\tS1\nuuid-2\n".as_bytes())
            .unwrap();
    assert_eq!(sheet.len(), 2);
    assert_eq!(
        SheetColumns::detect(sheet.headers()).file_id.as_deref(),
        Some("File ID")
    );
    let map = IdentityMap::from_sheet(&sheet);
    assert_eq!(map.resolve("uuid-1"), sample("S1"));
    assert_eq!(map.resolve("uuid-2"), None);
}

#[test]
fn load_reports_missing_sheet() {
    let err = SampleSheet::load(camino::Utf8Path::new("/no/such/sheet.tsv")).unwrap_err();
    assert!(err.to_string().contains("/no/such/sheet.tsv"));
}
