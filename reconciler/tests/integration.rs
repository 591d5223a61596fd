use std::io::Write;

use reconciler::{DiagnosticError, ReconcileError, ResultRecord};

fn parse(source: &str) -> Vec<ResultRecord> {
    reconciler::parse_text(source).expect("parse failed")
}

fn parse_err(source: &str) -> DiagnosticError {
    reconciler::parse_text(source).expect_err("parse should fail")
}

fn banner(marker: &str, time: &str) -> String {
    format!(
        "########################################\n# {} started {:<20} #\n########################################\n",
        marker, time
    )
}

/// One block with a single subtest whose table row is `row`.
fn login_block(row: &str) -> String {
    format!(
        "{}10:00:01 login test start\nexecuting login\n10:00:03 login test end\n----------------------------------------\n{}\n<_f_login>\n",
        banner("_f_login", "10:00:01"),
        row
    )
}

fn summary(entries: &[&str]) -> String {
    format!("Test_Start\n{}\nCapture end\n", entries.join("\n"))
}

fn find<'a>(records: &'a [ResultRecord], item: &str, name: Option<&str>) -> &'a ResultRecord {
    records
        .iter()
        .find(|r| r.test_item == item && r.test_name.as_deref() == name && !r.is_summary())
        .unwrap_or_else(|| panic!("no record for {} / {:?} in {:#?}", item, name, records))
}

fn summary_record(records: &[ResultRecord]) -> &ResultRecord {
    let last = records.last().expect("no records");
    assert!(last.is_summary(), "last record is not the summary: {:?}", last);
    last
}

#[test]
fn passing_subtest_yields_subtest_block_and_summary() {
    let log = format!(
        "09:59:58 harness boot\n{}{}",
        login_block("login PASS 1.5 0"),
        summary(&["_f_login 10:00:01"])
    );
    let records = parse(&log);
    assert_eq!(records.len(), 3);

    let subtest = find(&records, "_f_login", Some("login"));
    assert_eq!(subtest.status, "PASS");
    assert_eq!(subtest.absolute_line_number, 4);
    assert_eq!(subtest.absolute_end_line_number, Some(6));
    assert_eq!(subtest.start_time.as_deref(), Some("10:00:01"));
    assert_eq!(subtest.end_time.as_deref(), Some("10:00:03"));
    assert_eq!(subtest.has_subtests, None);

    let block = find(&records, "_f_login", None);
    assert_eq!(block.status, "PASS");
    assert_eq!(block.has_subtests, Some(true));
    assert_eq!(block.absolute_line_number, 1);
    assert_eq!(block.absolute_end_line_number, Some(9));

    let verdict = summary_record(&records);
    assert_eq!(verdict.status, "PASS");
    assert_eq!(verdict.absolute_line_number, 9);
    assert_eq!(verdict.absolute_end_line_number, Some(12));
}

#[test]
fn failing_last_row_fails_block_and_summary() {
    let log = format!(
        "09:59:58 harness boot\n{}{}",
        login_block("login FAIL 1.5 7"),
        summary(&["_f_login 10:00:01"])
    );
    let records = parse(&log);
    assert_eq!(find(&records, "_f_login", None).status, "FAIL");
    assert_eq!(summary_record(&records).status, "FAIL");
}

#[test]
fn orphan_marker_is_skipped_with_warning() {
    let log = format!(
        "{}{}",
        login_block("login PASS 1.5 0"),
        summary(&["_f_login 10:00:01", "_f_orphan 10:05:00"])
    );
    let patterns = logscan::Conventions::default().compile().expect("compiles");
    let source = logscan::LogSource::new(log);
    let report = reconciler::parse_log(&source, 0, &patterns).expect("parse failed");

    assert!(report.records.iter().all(|r| r.test_item != "_f_orphan"));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].marker, "_f_orphan");
    assert_eq!(report.markers.len(), 2);
    assert_eq!(summary_record(&report.records).status, "PASS");
}

#[test]
fn trailing_error_id_fails_last_record() {
    let log = format!(
        "{}teardown: ErrorID=0x2A\n{}",
        login_block("login PASS 1.5 0"),
        summary(&["_f_login 10:00:01"])
    );
    let records = parse(&log);
    assert_eq!(find(&records, "_f_login", Some("login")).status, "PASS");
    assert_eq!(find(&records, "_f_login", None).status, "FAIL");
    assert_eq!(summary_record(&records).status, "FAIL");
}

#[test]
fn error_id_inside_a_block_is_not_trailing() {
    let log = format!(
        "{}{}",
        login_block("login PASS 1.5 0").replace("executing login", "executing login\nerrorid seen"),
        summary(&["_f_login 10:00:01"])
    );
    let records = parse(&log);
    assert_eq!(find(&records, "_f_login", None).status, "PASS");
}

#[test]
fn block_without_table_is_forced_to_pass() {
    let log = format!(
        "{}10:00:02 FAILURE: everything broke\n<_f_raw>\n{}",
        banner("_f_raw", "10:00:01"),
        summary(&["_f_raw 10:00:01"])
    );
    let records = parse(&log);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].test_item, "_f_raw");
    assert_eq!(records[0].status, "PASS");
    assert_eq!(records[0].has_subtests, Some(false));
    assert_eq!(records[0].absolute_line_number, 0);
    assert_eq!(records[0].absolute_end_line_number, Some(4));
}

#[test]
fn table_without_narrative_is_forced_to_pass() {
    let log = format!(
        "{}----\nflash FAIL 1.0 9\n<_f_raw>\n{}",
        banner("_f_raw", "10:00:01"),
        summary(&["_f_raw 10:00:01"])
    );
    let records = parse(&log);
    assert_eq!(records[0].status, "PASS");
    assert_eq!(records[0].has_subtests, Some(false));
}

#[test]
fn aggregate_and_disabled_rows_never_surface() {
    let block = format!(
        "{}10:00:01 === test start ===\nexecuting alpha\n10:00:02 alpha test end\n10:00:03 beta test start\n10:00:04 beta test end\n10:00:05 total test start\n10:00:06 test end\n----\nalpha PASS 1 0\nskip DISABLED 0 0\nbeta PASS 1 0\ntotal PASS 2 0\n<_f_set>\n",
        banner("_f_set", "10:00:01")
    );
    let records = parse(&format!("{}{}", block, summary(&["_f_set 10:00:01"])));

    let names: Vec<&str> = records.iter().filter_map(|r| r.test_name.as_deref()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert!(records.iter().all(|r| r.status != "DISABLED"));
    assert_eq!(find(&records, "_f_set", None).status, "PASS");
}

#[test]
fn subtests_claim_distinct_narrative_spans() {
    let block = format!(
        "{}10:00:01 alpha test start\n10:00:02 test end\n10:00:03 beta test start\n10:00:04 test end\n----\nalpha PASS 1 0\nbeta FAIL 1 5\n<_f_set>\n",
        banner("_f_set", "10:00:01")
    );
    let records = parse(&format!("{}{}", block, summary(&["_f_set 10:00:01"])));

    let alpha = find(&records, "_f_set", Some("alpha"));
    let beta = find(&records, "_f_set", Some("beta"));
    assert_eq!((alpha.absolute_line_number, alpha.absolute_end_line_number), (3, Some(4)));
    assert_eq!((beta.absolute_line_number, beta.absolute_end_line_number), (5, Some(6)));
    assert_eq!(beta.status, "FAIL");
    assert_eq!(beta.end_time.as_deref(), Some("10:00:04"));
}

#[test]
fn subtest_without_end_phrase_has_open_end() {
    let block = format!(
        "{}10:00:01 alpha test start\nlog stopped\n----\nalpha PASS 1 0\n<_f_cut>\n",
        banner("_f_cut", "10:00:01")
    );
    let records = parse(&format!("{}{}", block, summary(&["_f_cut 10:00:01"])));
    let alpha = find(&records, "_f_cut", Some("alpha"));
    assert_eq!(alpha.absolute_line_number, 3);
    assert_eq!(alpha.absolute_end_line_number, None);
    assert_eq!(alpha.end_time, None);
}

#[test]
fn specific_phrase_without_generic_start_drops_subtest() {
    // "executing alpha" has no timestamped "test start" above it.
    let block = format!(
        "{}executing alpha\n10:00:03 beta test start\n10:00:04 test end\n----\nalpha PASS 1 0\nbeta PASS 1 0\n<_f_set>\n",
        banner("_f_set", "10:00:01")
    );
    let err = parse_err(&format!("{}{}", block, summary(&["_f_set 10:00:01"])));
    // beta is now paired with alpha's row.
    assert!(matches!(
        err.error,
        ReconcileError::UnmatchedResult { ref case, ref row, .. } if case == "beta" && row == "alpha"
    ));
    assert_eq!(err.line, Some(7));
}

#[test]
fn stray_end_before_first_subtest_falls_back_to_pass() {
    let block = format!(
        "{}prev_step test end 09:59:59\n10:00:01 a test start\n10:00:02 test end\n10:00:03 b test start\n10:00:04 test end\n----\na PASS 1 0\nb FAIL 1 3\n<_f_x>\n",
        banner("_f_x", "10:00:01")
    );
    let records = parse(&format!("{}{}", block, summary(&["_f_x 10:00:01"])));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].test_item, "_f_x");
    assert_eq!(records[0].status, "PASS");
    assert_eq!(records[0].has_subtests, Some(false));
    assert_eq!(summary_record(&records).status, "PASS");
}

#[test]
fn oversized_error_code_keeps_failing_row() {
    let log = format!(
        "{}{}",
        login_block("login FAIL 1.5 99999999999999999999"),
        summary(&["_f_login 10:00:01"])
    );
    let records = parse(&log);
    assert_eq!(find(&records, "_f_login", Some("login")).status, "FAIL");
    assert_eq!(find(&records, "_f_login", None).status, "FAIL");
    assert_eq!(summary_record(&records).status, "FAIL");
}

#[test]
fn unmatched_result_aborts_even_after_good_blocks() {
    let bad = format!(
        "{}13:00:00 alpha test start\n13:00:01 test end\n13:00:02 beta test start\n13:00:03 test end\n----\nalpha PASS 1 0\nghost PASS 1 0\nbeta PASS 1 0\n<_f_mix>\n",
        banner("_f_mix", "13:00:00")
    );
    let log = format!(
        "{}{}{}",
        login_block("login PASS 1.5 0"),
        bad,
        summary(&["_f_login 10:00:01", "_f_mix 13:00:00"])
    );
    let err = parse_err(&log);
    assert!(err.to_string().contains("no matching result found for test case 'beta'"));
}

#[test]
fn sentinel_row_is_reported_as_passing() {
    let block = format!(
        "{}08:00:00 endtest test start\n08:00:01 endtest test end\n----\nsetup FAIL 0.5 2\nENDTEST PASS 0.0 0\n<_f_boot>\n",
        banner("_f_boot", "08:00:00")
    );
    let records = parse(&format!("{}{}", block, summary(&["_f_boot 08:00:00"])));
    let sentinel = find(&records, "_f_boot", Some("ENDTEST"));
    assert_eq!(sentinel.status, "PASS");
    assert_eq!(summary_record(&records).status, "PASS");
}

#[test]
fn missing_summary_and_markers_are_fatal() {
    let err = parse_err(&login_block("login PASS 1.5 0"));
    assert!(matches!(err.error, ReconcileError::Scan(_)));
    assert!(err.to_string().contains("could not locate summary block"));

    let err = parse_err(&format!("{}{}", login_block("login PASS 1.5 0"), summary(&["_f_login"])));
    assert!(err.to_string().contains("no _f_ markers found"));
    assert_eq!(err.line, Some(9));
}

#[test]
fn only_summary_when_no_block_is_placed() {
    let records = parse(&summary(&["_f_ghost 10:00:00"]));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "PASS");
    assert_eq!(records[0].absolute_line_number, 0);
}

#[test]
fn block_records_never_overlap() {
    let log = format!(
        "{}{}{}{}",
        login_block("login PASS 1.5 0"),
        login_block("login FAIL 1.5 1").replace("10:00:01", "11:00:00"),
        login_block("login PASS 1.5 0").replace("10:00:01", "12:00:00"),
        summary(&["_f_login 10:00:01", "_f_login 11:00:00", "_f_login 12:00:00"])
    );
    let records = parse(&log);
    let blocks: Vec<&ResultRecord> = records.iter().filter(|r| r.is_block()).collect();
    assert_eq!(blocks.len(), 3);
    for (i, a) in blocks.iter().enumerate() {
        for b in &blocks[i + 1..] {
            let a_end = a.absolute_end_line_number.expect("block end");
            let b_end = b.absolute_end_line_number.expect("block end");
            assert!(
                a_end < b.absolute_line_number || b_end < a.absolute_line_number,
                "{:?} overlaps {:?}",
                a,
                b
            );
        }
    }
}

#[test]
fn records_serialize_with_viewer_field_names() {
    let log = format!("{}{}", login_block("login PASS 1.5 0"), summary(&["_f_login 10:00:01"]));
    let records = parse(&log);
    let json = serde_json::to_value(&records).expect("serializable");

    assert_eq!(json[0]["testItem"], "_f_login");
    assert_eq!(json[0]["testName"], "login");
    assert!(json[0].get("hasSubtests").is_none());
    assert_eq!(json[1]["hasSubtests"], true);
    assert_eq!(json[1]["absoluteLineNumber"], 0);
    assert!(json[1]["startTime"].is_null());
    assert_eq!(json[2]["testItem"], "Summary");
    assert!(json[2].get("testName").is_none());
    assert!(json[2].get("hasSubtests").is_none());
}

#[test]
fn parsing_is_deterministic() {
    let log = format!(
        "{}{}",
        login_block("login FAIL 1.5 7"),
        summary(&["_f_login 10:00:01", "_f_lost 10:10:10"])
    );
    let first = serde_json::to_string_pretty(&parse(&log)).expect("serializable");
    let second = serde_json::to_string_pretty(&parse(&log)).expect("serializable");
    assert_eq!(first, second);
}

#[test]
fn parse_file_reads_from_disk() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("run.log");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        "{}{}",
        login_block("login PASS 1.5 0"),
        summary(&["_f_login 10:00:01"])
    )
    .unwrap();

    let records = reconciler::parse_file(&path).expect("parse failed");
    assert_eq!(records.len(), 3);

    let err = reconciler::parse_file(&dir.path().join("missing.log")).expect_err("should fail");
    assert!(matches!(err.error, ReconcileError::IoError(_)));
}
