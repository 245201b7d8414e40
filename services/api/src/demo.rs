use crate::infra::InMemoryCaseNotifier;
use chrono::NaiveDate;
use clap::Args;
use onboard_ai::error::AppError;
use onboard_ai::workflows::backfill::CaseBackfillImporter;
use onboard_ai::workflows::onboarding::cases::{
    AmlDeclarations, CaseServiceError, CaseSubmission, CompanyAddress, DirectorDeclaration,
    InMemoryCaseStore, OfficerAction, OnboardingCase, OnboardingCaseService, SettlementDetails,
    UboDeclaration,
};
use onboard_ai::workflows::onboarding::progress::ProgressTracker;
use onboard_ai::workflows::onboarding::screening::{
    AgentLogDraft, ChecklistConfig, ScreeningStage,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Route the case through a clarification request instead of AML review
    #[arg(long)]
    pub(crate) clarify: bool,
    /// Print every stored agent log grouped by stage at the end
    #[arg(long)]
    pub(crate) show_logs: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BackfillArgs {
    /// Path to the legacy intake CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

pub(crate) fn run_backfill(args: BackfillArgs) -> Result<(), AppError> {
    let backfill = CaseBackfillImporter::from_path(&args.csv)?;
    let notifier = Arc::new(InMemoryCaseNotifier::default());
    let service = OnboardingCaseService::new(
        Arc::new(InMemoryCaseStore::new()),
        notifier,
        ChecklistConfig::standard(),
    );

    println!("Backfill from {}", args.csv.display());

    let mut restored = 0usize;
    let mut failed = 0usize;
    for seed in backfill.seeds {
        let tracking_code = seed.tracking_code.clone().unwrap_or_default();
        match service.restore(seed) {
            Ok(record) => {
                restored += 1;
                println!(
                    "- Restored {} ({}) -> {}",
                    record.case.case_id.0,
                    record.case.tracking_code,
                    record.case.status.label()
                );
            }
            Err(err) => {
                failed += 1;
                println!("- Refused {tracking_code}: {err}");
            }
        }
    }

    for skipped in &backfill.skipped {
        println!(
            "- Skipped row {} ({}): {}",
            skipped.row,
            skipped.tracking_code.as_deref().unwrap_or("no tracking id"),
            skipped.reason
        );
    }

    println!(
        "Done: {restored} restored, {failed} refused, {} skipped",
        backfill.skipped.len()
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    if let Err(err) = walk_case(args) {
        println!("demo aborted: {err}");
    }
    Ok(())
}

fn walk_case(args: DemoArgs) -> Result<(), CaseServiceError> {
    let notifier = Arc::new(InMemoryCaseNotifier::default());
    let service = OnboardingCaseService::new(
        Arc::new(InMemoryCaseStore::new()),
        notifier.clone(),
        ChecklistConfig::standard(),
    );

    println!("Compliance onboarding demo");

    let record = service.create_case(demo_submission())?;
    let case_id = record.case.case_id.clone();
    println!(
        "- Opened case {} ({}) for {} -> {}",
        case_id.0,
        record.case.tracking_code,
        record.case.profile.company_name,
        record.case.status.label()
    );

    let mut portal = ProgressTracker::with_interval(service.poll_interval());
    report_poll(&mut portal, &record.case);

    println!("\nStage 1 (KYC) screening:");
    for draft in stage_one_findings() {
        let receipt = service.ingest_agent_log(&case_id, draft)?;
        println!(
            "  - {}: {} ({})",
            receipt.check_name,
            receipt.risk_level.label(),
            receipt.recommendation.label()
        );
        if let Some(target) = receipt.advanced_to {
            println!("  => stage 1 complete, case advanced to {}", target.label());
        }
    }
    report_poll(&mut portal, &service.fetch_case(&case_id)?);

    println!("\nEvidence review (submitted vs extracted):");
    let detail = service.case_detail(&case_id)?;
    for comparison in &detail.evidence {
        match &comparison.extracted {
            Some(extracted) if comparison.matches => {
                println!("  - {}: '{}' == '{}'", comparison.field, comparison.submitted, extracted);
            }
            Some(extracted) => {
                println!(
                    "  - {}: '{}' != '{}'  MISMATCH",
                    comparison.field, comparison.submitted, extracted
                );
            }
            None => println!("  - {}: no extraction yet", comparison.field),
        }
    }
    println!("  Officer actions available: {:?}", detail.available_actions);

    if args.clarify {
        let record = service.submit_action(
            &case_id,
            OfficerAction::Clarify,
            Some("please upload a certified UBO register extract".to_string()),
        )?;
        println!(
            "\nOfficer: clarify -> {} ({})",
            record.case.status.label(),
            record
                .case
                .history
                .last()
                .and_then(|entry| entry.remarks.as_deref())
                .unwrap_or("no remarks")
        );
        report_poll(&mut portal, &record.case);

        let record = service.submit_action(
            &case_id,
            OfficerAction::Approve,
            Some("extract received and verified".to_string()),
        )?;
        println!("Officer: approve -> {}", record.case.status.label());
        report_poll(&mut portal, &record.case);
    } else {
        let record = service.submit_action(&case_id, OfficerAction::Approve, None)?;
        println!("\nOfficer: approve -> {}", record.case.status.label());
        report_poll(&mut portal, &record.case);

        println!("\nStage 2 (AML risk) screening:");
        for draft in stage_two_findings() {
            let receipt = service.ingest_agent_log(&case_id, draft)?;
            println!(
                "  - {}: {} ({})",
                receipt.check_name,
                receipt.risk_level.label(),
                receipt.recommendation.label()
            );
            if let Some(target) = receipt.advanced_to {
                println!("  => stage 2 complete, case advanced to {}", target.label());
            }
        }
        report_poll(&mut portal, &service.fetch_case(&case_id)?);

        let record = service.submit_action(
            &case_id,
            OfficerAction::Approve,
            Some("risk accepted under enhanced monitoring".to_string()),
        )?;
        println!("Officer: approve -> {}", record.case.status.label());
        report_poll(&mut portal, &record.case);
    }

    // The terminal case now refuses everything.
    if let Err(err) = service.submit_action(&case_id, OfficerAction::Reject, None) {
        println!("\nLate reject refused: {err}");
    }

    let case = service.fetch_case(&case_id)?;
    print_audit_trail(&case);

    println!("\nApplicant notices sent:");
    for notice in notifier.events() {
        println!(
            "  - {} ({})",
            notice.template,
            notice
                .details
                .get("status")
                .map(String::as_str)
                .unwrap_or("no status")
        );
    }

    if args.show_logs {
        let grouped = service.agent_logs(&case_id)?;
        println!("\nStored agent logs:");
        for (stage, logs) in [(1u8, &grouped.stage_one), (2u8, &grouped.stage_two)] {
            println!("  Stage {stage}:");
            for log in logs {
                println!(
                    "    - {} by {}: {} ({}) - {}",
                    log.check_name,
                    log.agent_name,
                    log.risk_level.label(),
                    log.recommendation.label(),
                    log.summary
                );
            }
        }
    }

    Ok(())
}

fn report_poll(portal: &mut ProgressTracker, case: &OnboardingCase) {
    let directive = portal.observe(case.status);
    let risk = case
        .derived_risk
        .map(|risk| risk.label())
        .unwrap_or("not yet assessed");
    match directive.next_poll_in {
        Some(interval) => println!(
            "  Portal: step {} ({}), risk {}, poll again in {}s",
            directive.phase.step,
            directive.phase.result.label(),
            risk,
            interval.as_secs()
        ),
        None => println!(
            "  Portal: step {} ({}), risk {}, polling stops",
            directive.phase.step,
            directive.phase.result.label(),
            risk
        ),
    }
}

fn print_audit_trail(case: &OnboardingCase) {
    println!("\nAudit trail for {} ({}):", case.case_id.0, case.tracking_code);
    for (index, entry) in case.history.iter().enumerate() {
        let from = entry
            .previous_status
            .map(|status| status.label())
            .unwrap_or("(opened)");
        println!(
            "  {}. {} -> {} by {}{}",
            index + 1,
            from,
            entry.status.label(),
            entry.actor,
            entry
                .remarks
                .as_deref()
                .map(|remarks| format!(": {remarks}"))
                .unwrap_or_default()
        );
    }
}

fn demo_submission() -> CaseSubmission {
    CaseSubmission {
        company_name: "Aurora Commodities B.V.".to_string(),
        registration_number: "76012345".to_string(),
        entity_type: "B.V.".to_string(),
        country: "Netherlands".to_string(),
        incorporation_date: NaiveDate::from_ymd_opt(2017, 9, 14).unwrap_or_default(),
        website: Some("https://auroracommodities.example".to_string()),
        contact_first_name: "Elena".to_string(),
        contact_last_name: "Ruiz".to_string(),
        contact_email: "elena.ruiz@auroracommodities.example".to_string(),
        address: CompanyAddress {
            street: "Herengracht 420".to_string(),
            city: "Amsterdam".to_string(),
            state: None,
            postal_code: "1017 BZ".to_string(),
        },
        directors: vec![DirectorDeclaration {
            full_name: "Elena Ruiz".to_string(),
            role: "Managing Director".to_string(),
            nationality: "Spain".to_string(),
            residency_country: "Netherlands".to_string(),
        }],
        ubos: vec![
            UboDeclaration {
                full_name: "Elena Ruiz".to_string(),
                ownership_percent: 70.0,
                nationality: "Spain".to_string(),
                residency_country: "Netherlands".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1981, 4, 2).unwrap_or_default(),
                tax_id: Some("ES-X1234567".to_string()),
                pep: false,
            },
            UboDeclaration {
                full_name: "Tomas Keller".to_string(),
                ownership_percent: 30.0,
                nationality: "Germany".to_string(),
                residency_country: "Germany".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1975, 12, 19).unwrap_or_default(),
                tax_id: None,
                pep: true,
            },
        ],
        declarations: AmlDeclarations {
            sanctions_exposure: false,
            source_of_funds: "Commodity trading revenue".to_string(),
            source_of_wealth: "Retained earnings and founder capital".to_string(),
            expected_volume: "EUR 5M monthly".to_string(),
            aml_program_confirmed: true,
        },
        banking: SettlementDetails {
            bank_name: "ING Bank N.V.".to_string(),
            routing_number: Some("INGBNL2A".to_string()),
            account_number: Some("NL91INGB0001234567".to_string()),
        },
    }
}

fn finding(
    stage: ScreeningStage,
    check: &str,
    risk: &str,
    recommendation: &str,
    summary: &str,
) -> AgentLogDraft {
    AgentLogDraft {
        run_id: Some(format!("demo-{check}")),
        agent_name: None,
        stage,
        check_name: check.to_string(),
        risk_level: risk.to_string(),
        recommendation: recommendation.to_string(),
        summary: summary.to_string(),
        structured_output: json!({}),
        input_context: json!({ "company_name": "Aurora Commodities B.V." }),
        flags: Vec::new(),
        model_used: Some("rule-based".to_string()),
        duration_ms: Some(180),
    }
}

fn stage_one_findings() -> Vec<AgentLogDraft> {
    let mut document_consistency = finding(
        ScreeningStage::Kyc,
        "document_consistency",
        "MEDIUM",
        "FLAG",
        "registration number on the certificate differs from the form",
    );
    // The OCR extraction disagrees with the submitted registration number so
    // the evidence panel has a mismatch to show.
    document_consistency.structured_output = json!({
        "extracted": {
            "company_name": "aurora commodities b.v.",
            "registration_number": "76012399",
        }
    });

    vec![
        finding(
            ScreeningStage::Kyc,
            "identity_verification",
            "LOW",
            "PASS",
            "contact identity verified against the submitted passport",
        ),
        document_consistency,
        finding(
            ScreeningStage::Kyc,
            "registry_lookup",
            "LOW",
            "PASS",
            "KvK registry entry active, officers match the form",
        ),
        finding(
            ScreeningStage::Kyc,
            "sanctions_screening",
            "LOW",
            "PASS",
            "no sanctions or PEP list hits for the company or its officers",
        ),
    ]
}

fn stage_two_findings() -> Vec<AgentLogDraft> {
    vec![
        finding(
            ScreeningStage::AmlRisk,
            "country_risk",
            "MEDIUM",
            "PASS",
            "operating footprint includes one medium-risk corridor",
        ),
        finding(
            ScreeningStage::AmlRisk,
            "transaction_volume",
            "HIGH",
            "FLAG",
            "declared volume is high for the stated customer base",
        ),
        finding(
            ScreeningStage::AmlRisk,
            "aml_questionnaire",
            "LOW",
            "PASS",
            "program confirmed, responses internally consistent",
        ),
    ]
}
