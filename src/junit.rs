use crate::test::Scenarios;
use junit_report::{Duration, ReportBuilder, TestCaseBuilder, TestSuiteBuilder};
use std::path::Path;

pub(crate) fn create_junit_xml(scenarios: &Scenarios, result_dir: &Path) {
    let mut test_cases = Vec::new();

    for s in scenarios.iter().map(|obj| obj.get()) {
        let tc = match s.result.as_ref().unwrap() {
            Ok(_) => TestCaseBuilder::success(&s.name, Duration::seconds_f64(s.time_secs)),
            Err(e) => TestCaseBuilder::failure(
                &s.name,
                Duration::seconds_f64(s.time_secs),
                "failure",
                &format!("{:?}", e),
            ),
        }
        .build();
        test_cases.push(tc);
    }

    let suite_name = crate::CRATE_NAME
        .get()
        .map(String::as_str)
        .unwrap_or(env!("CARGO_PKG_NAME"));
    let test_suite = TestSuiteBuilder::new(suite_name)
        .add_testcases(test_cases)
        .build();
    let report = ReportBuilder::new().add_testsuite(test_suite).build();
    let file = std::fs::File::create(result_dir.join("results.xml")).unwrap();
    report.write_xml(file).unwrap();
}
