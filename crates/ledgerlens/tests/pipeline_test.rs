//! Runs a filing directory end to end: config, loading, mapping, verification
//! and report files.

use ledgerlens::{FilingInput, Pipeline, Settings};
use ledgerlens_verify::{MatchStatus, RuleBasis, RuleStatus};
use std::fs;
use std::path::Path;

const INSTANCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:us-gaap="http://fasb.org/us-gaap/2024" xmlns:dei="http://xbrl.sec.gov/dei/2024">
  <xbrli:context id="FY2024">
    <xbrli:period><xbrli:startDate>2023-10-01</xbrli:startDate><xbrli:endDate>2024-09-28</xbrli:endDate></xbrli:period>
  </xbrli:context>
  <xbrli:context id="BS2024"><xbrli:period><xbrli:instant>2024-09-28</xbrli:instant></xbrli:period></xbrli:context>
  <xbrli:context id="BS2023"><xbrli:period><xbrli:instant>2023-09-30</xbrli:instant></xbrli:period></xbrli:context>
  <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <dei:EntityRegistrantName contextRef="FY2024">Apple Inc.</dei:EntityRegistrantName>
  <us-gaap:AssetsCurrent contextRef="BS2024" unitRef="usd" decimals="-6">152987000000</us-gaap:AssetsCurrent>
  <us-gaap:Assets contextRef="BS2024" unitRef="usd" decimals="-6">364980000000</us-gaap:Assets>
  <us-gaap:Assets contextRef="BS2023" unitRef="usd" decimals="-6">352583000000</us-gaap:Assets>
  <us-gaap:Liabilities contextRef="BS2024" unitRef="usd" decimals="-6">308030000000</us-gaap:Liabilities>
  <us-gaap:StockholdersEquity contextRef="BS2024" unitRef="usd" decimals="-6">56950000000</us-gaap:StockholdersEquity>
  <us-gaap:NetIncomeLoss contextRef="FY2024" unitRef="usd" decimals="-6">93736000000</us-gaap:NetIncomeLoss>
</xbrli:xbrl>
"#;

const BALANCE_SHEET: &str = "\
CONSOLIDATED BALANCE SHEETS (In millions),FY2024,FY2023
Current assets:,,
Total current assets,\"152,987\",\"143,566\"
Total assets,\"364,980\",\"352,583\"
Total liabilities,\"308,030\",\"290,437\"
Total shareholders’ equity,\"56,950\",\"62,146\"
";

const INCOME_STATEMENT: &str = "\
CONSOLIDATED STATEMENTS OF OPERATIONS,FY2024,FY2023
Net income,\"93,736\",\"96,995\"
";

fn write_filing(root: &Path) -> std::path::PathBuf {
    let filing = root.join("aapl-10k-2024");
    fs::create_dir_all(filing.join("tables")).unwrap();
    fs::write(filing.join("xbrl.xml"), INSTANCE).unwrap();
    fs::write(filing.join("tables").join("balance_sheet.csv"), BALANCE_SHEET).unwrap();
    fs::write(
        filing.join("tables").join("income_statement.csv"),
        INCOME_STATEMENT,
    )
    .unwrap();
    filing
}

#[test]
fn test_filing_directory_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let filing = write_filing(root.path());
    let config = root.path().join("ledgerlens.toml");
    fs::write(&config, "[verifier]\ntarget_period_end = \"2024-09-28\"\n").unwrap();

    let (settings, origin) = Settings::load(Some(&config)).unwrap();
    assert_eq!(origin.as_deref(), Some(config.as_path()));

    let pipeline = Pipeline::new(&settings).unwrap();
    let input = FilingInput::from_dir(&filing).unwrap();
    assert_eq!(input.name, "Apple Inc. (aapl-10k-2024)");

    let run = pipeline.run(&input);
    assert_eq!(run.summary.total_concepts, 5);
    assert_eq!(run.summary.mapped, 5);
    assert_eq!(run.summary.verified, 5);
    assert_eq!(run.verification.count(MatchStatus::ExactMatch), 5);

    // The income statement declares no scale; millions is inferred.
    let net_income = run.verification.result("us-gaap:NetIncomeLoss").unwrap();
    assert!(net_income.scale_inferred);

    for basis in [RuleBasis::Xbrl, RuleBasis::Pdf] {
        let equation = run
            .verification
            .rules_on(basis)
            .find(|r| r.rule == "Balance Sheet Equation")
            .unwrap();
        assert_eq!(equation.status, RuleStatus::Passed);
    }

    let out = root.path().join("out");
    let written = pipeline.report(run).unwrap().write_to_dir(&out).unwrap();
    assert_eq!(written.len(), 7);
    let verification_report = fs::read_to_string(out.join("verification_report.md")).unwrap();
    assert!(verification_report.contains("# Cross-Verification Report: Apple Inc."));
}

#[test]
fn test_batch_continues_past_bad_filing() {
    let root = tempfile::tempdir().unwrap();
    let good = write_filing(root.path());
    let empty = root.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    let results = Pipeline::default().run_dirs(&[empty, good], |_, _| {});
    assert!(results[0].is_err());
    let run = results[1].as_ref().unwrap();
    assert_eq!(run.summary.verified, 5);
}
