use chrono::{TimeZone, Utc};
use lead_qualifier::workflows::prospecting::intake::parse_csv;
use lead_qualifier::workflows::prospecting::{
    aggregate, deduplicate, normalize, write_leads_csv, Criterion, QualificationConfig,
    QualificationEngine, QualificationLevel, SourceTag,
};

const COLLECTOR_EXPORT: &str = "\
Nome,Telefone,Site,Endereco,CNAE,Fonte,Instagram
Mercado X,(11) 99999-9999,,\"Rua A, 100, Centro, City, ST\",4721-1/01,Google Places,
Padaria Estrela,(11) 3333-4444,https://padaria.example.com,\"Rua B, 200, Centro, City, ST\",1091-1/02,instagram,@padariaestrela
mercado x,11999999999,,\"rua a, 100, centro, city, st\",,receita,
,,,,,manual,
Oficina 123,,,,,manual,
";

#[tokio::test]
async fn collector_export_flows_through_to_a_report() {
    let received_at = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    let records = parse_csv(COLLECTOR_EXPORT.as_bytes()).expect("export parses");
    assert_eq!(records.len(), 5);

    let (candidates, rejected): (Vec<_>, Vec<_>) = records
        .iter()
        .map(|record| normalize(record, received_at))
        .partition(Result::is_ok);
    assert_eq!(rejected.len(), 1, "the row without a name is rejected");
    let candidates: Vec<_> = candidates.into_iter().filter_map(Result::ok).collect();

    let deduplicated = deduplicate(candidates);
    assert_eq!(deduplicated.unique.len(), 3);
    assert_eq!(deduplicated.duplicates.len(), 1);
    assert_eq!(deduplicated.unique[0].source, SourceTag::Places);

    let engine = std::sync::Arc::new(QualificationEngine::offline(QualificationConfig::default()));
    let leads = engine.score_all(deduplicated.unique).await;

    let market = &leads[0];
    assert_eq!(market.score(), 5);
    assert_eq!(market.level(), QualificationLevel::High);

    let bakery = &leads[1];
    assert!(!bakery.matched_criteria().contains(&Criterion::ActiveWebsite));
    assert!(bakery.matched_criteria().contains(&Criterion::SocialPresence));
    assert_eq!(bakery.score(), 6);

    let workshop = &leads[2];
    assert_eq!(workshop.score(), 1);
    assert!(!workshop.qualified());

    let report = aggregate(&leads, Utc::now());
    assert_eq!(report.total, 3);
    assert_eq!(report.qualified, 2);
    assert_eq!(report.headline, "Of 3 leads, 2 were qualified (66.7%)");
    assert_eq!(report.top_leads[0].name(), "Padaria Estrela");

    let summary = report.summary();
    assert_eq!(summary.mean_score, 4.0);
    assert_eq!(summary.top_criteria[0].hits, 3);
}

#[tokio::test]
async fn scored_leads_export_as_csv_rows() {
    let received_at = Utc::now();
    let records = parse_csv(COLLECTOR_EXPORT.as_bytes()).expect("export parses");
    let candidates: Vec<_> = records
        .iter()
        .filter_map(|record| normalize(record, received_at).ok())
        .collect();
    let engine = std::sync::Arc::new(QualificationEngine::offline(QualificationConfig::default()));
    let leads = engine.score_all(candidates).await;

    let mut buffer = Vec::new();
    write_leads_csv(&mut buffer, &leads).expect("csv export");
    let exported = String::from_utf8(buffer).expect("utf-8 export");
    let lines: Vec<&str> = exported.lines().collect();

    assert_eq!(lines.len(), leads.len() + 1);
    assert!(lines[0].starts_with("name,phone,website,address,industry_code"));
    assert!(lines[1].starts_with("Mercado X,11999999999,,"));
    assert!(lines[1].contains("4721101"));
    assert!(lines[1].contains("High"));
}
