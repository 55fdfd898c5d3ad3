use crate::infra::build_campaign_service;
use clap::Args;
use lead_qualifier::config::AppConfig;
use lead_qualifier::error::AppError;
use lead_qualifier::telemetry;
use lead_qualifier::workflows::prospecting::{
    load_path, write_leads_csv, CampaignRecord, CampaignRequest, RawRecord,
};
use std::fs::File;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub(crate) struct QualifyArgs {
    /// Collector export to qualify (.csv or .json)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Campaign name shown in the report
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Write every scored lead to this CSV file
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Write the report summary to this JSON file
    #[arg(long)]
    pub(crate) json: Option<PathBuf>,
    /// Never probe websites or call the company registry
    #[arg(long)]
    pub(crate) offline: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Probe the sample websites over the network instead of treating them as unreachable
    #[arg(long)]
    pub(crate) online: bool,
    /// Print every scored lead, not only the top of the ranking
    #[arg(long)]
    pub(crate) list_leads: bool,
}

pub(crate) async fn run_qualify(args: QualifyArgs) -> Result<(), AppError> {
    let QualifyArgs {
        input,
        name,
        output,
        json,
        offline,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let records = load_path(&input)?;
    let name = name.or_else(|| {
        input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
    });

    let cancel = CancellationToken::new();
    let (service, _repository) =
        build_campaign_service(&config.qualification, offline, cancel.clone())?;
    let record = service.run(CampaignRequest { name, records }, &cancel).await?;

    render_campaign(&record, false);

    if let Some(path) = output {
        write_leads_csv(File::create(&path)?, &record.leads)?;
        println!("\nLeads written to {}", path.display());
    }
    if let Some(path) = json {
        serde_json::to_writer_pretty(File::create(&path)?, &record.report.summary())
            .map_err(std::io::Error::from)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let cancel = CancellationToken::new();
    let (service, _repository) =
        build_campaign_service(&config.qualification, !args.online, cancel.clone())?;

    println!("Lead qualification demo");
    let request = CampaignRequest {
        name: Some("Sample prospects".to_string()),
        records: sample_records(),
    };
    let record = service.run(request, &cancel).await?;
    render_campaign(&record, args.list_leads);

    Ok(())
}

pub(crate) fn render_campaign(record: &CampaignRecord, list_leads: bool) {
    let stats = &record.stats;
    println!("Campaign {} ({})", record.name, record.id);
    println!(
        "- {} records received | {} skipped | {} duplicates | {} scored",
        stats.received, stats.skipped, stats.duplicates, stats.scored
    );
    if stats.cancelled {
        println!(
            "- cancelled before completion; {} candidates never scheduled",
            stats.unscheduled
        );
    }
    if stats.scoring_failures > 0 {
        println!("- {} leads could not be scored", stats.scoring_failures);
    }

    for skipped in &record.skipped {
        println!("  skipped record #{}: {}", skipped.index, skipped.reason);
    }

    let summary = record.report.summary();
    println!("\n{}", summary.headline);
    println!("Mean score: {:.2}", summary.mean_score);

    println!("\nLevels");
    for entry in &summary.level_distribution {
        println!("- {}: {}", entry.level_label, entry.count);
    }

    println!("\nSources");
    for entry in &summary.source_distribution {
        println!("- {}: {}", entry.source_label, entry.count);
    }

    if summary.top_criteria.is_empty() {
        println!("\nTop criteria: none matched");
    } else {
        println!("\nTop criteria");
        for entry in &summary.top_criteria {
            println!("- {}: {}", entry.label, entry.hits);
        }
    }

    if list_leads {
        println!("\nLeads");
        for lead in &record.leads {
            println!(
                "- {} | score {} | {} | {}",
                lead.name(),
                lead.score(),
                lead.level().label(),
                lead.qualification_notes()
            );
        }
    } else if !summary.top_leads.is_empty() {
        println!("\nTop leads");
        for lead in &summary.top_leads {
            println!("- {} | score {} | {}", lead.name, lead.score, lead.level_label);
        }
    }
}

fn sample_record(
    name: &str,
    phone: &str,
    website: &str,
    address: &str,
    industry_code: &str,
    source: &str,
) -> RawRecord {
    let text = |value: &str| (!value.is_empty()).then(|| value.to_string());
    RawRecord {
        name: text(name),
        phone: text(phone),
        website: text(website),
        address: text(address),
        industry_code: text(industry_code),
        source: text(source),
        ..RawRecord::default()
    }
}

pub(crate) fn sample_records() -> Vec<RawRecord> {
    let mut gym = sample_record(
        "Academia Corpo Ativo",
        "(19) 3232-1010",
        "https://corpoativo.example.com",
        "Rua das Flores, 20, Jardim, Campinas, SP",
        "9313-1/00",
        "instagram",
    );
    gym.social_handle = Some("@corpoativo".to_string());

    vec![
        sample_record(
            "Supermercado Bom Preço",
            "(11) 98765-4321",
            "",
            "Av. Central, 500, Centro, Campinas, SP",
            "4711-3/02",
            "google_places",
        ),
        sample_record(
            "Padaria Estrela",
            "(11) 3333-4444",
            "https://padariaestrela.example.com",
            "Rua A, 100, Centro, Campinas, SP",
            "1091-1/02",
            "google_places",
        ),
        gym,
        sample_record(
            "PADARIA ESTRELA",
            "11 3333 4444",
            "",
            "rua a, 100, centro, campinas, sp",
            "",
            "receita",
        ),
        sample_record("Oficina 22", "", "", "Rua B", "", "manual"),
        sample_record("", "(11) 4002-8922", "", "", "", "manual"),
    ]
}
