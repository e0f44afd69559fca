//! JUnit XML → generic suite / test-case structure.
//!
//! Accepts `<testsuites>` roots, bare `<testsuite>` roots, nested suites and
//! stray `<testcase>` elements (collected into an unnamed suite). Each test
//! case carries at most one failure cause: the first `<failure>`, `<error>`
//! or `<skipped>` child wins.

use std::time::Duration;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::domain::error::JunitError;
use crate::domain::report::FailureCause;

/// A named group of test cases as emitted by a test runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSuite {
    pub name: String,
    pub tests: Vec<RawTestCase>,
}

/// One executed test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTestCase {
    pub name: String,
    pub classname: Option<String>,
    pub failure: Option<FailureCause>,
    pub duration: Duration,
}

impl RawSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    pub fn with_test(mut self, test: RawTestCase) -> Self {
        self.tests.push(test);
        self
    }
}

impl RawTestCase {
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn failed(name: impl Into<String>, cause: FailureCause) -> Self {
        Self {
            name: name.into(),
            failure: Some(cause),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Turns one raw report document into suites.
pub trait SuiteParser: Send + Sync {
    fn parse(&self, document: &str, bytes: &[u8]) -> Result<Vec<RawSuite>, JunitError>;
}

/// [`SuiteParser`] for JUnit XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct JunitParser;

impl SuiteParser for JunitParser {
    fn parse(&self, document: &str, bytes: &[u8]) -> Result<Vec<RawSuite>, JunitError> {
        parse_junit(document, bytes)
    }
}

/// Parse a JUnit XML document. `document` names it in error messages.
pub fn parse_junit(document: &str, bytes: &[u8]) -> Result<Vec<RawSuite>, JunitError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut state = ParseState::default();
    let mut buf = Vec::new();
    loop {
        let position = reader.buffer_position() as u64;
        let malformed = |detail: String| JunitError::Malformed {
            document: document.to_string(),
            position,
            detail,
        };

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => state.open(&e, false).map_err(malformed)?,
            Ok(Event::Empty(e)) => state.open(&e, true).map_err(malformed)?,
            Ok(Event::End(e)) => state.close(e.local_name().as_ref()),
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| malformed(e.to_string()))?;
                state.text(&text);
            }
            Ok(Event::CData(c)) => state.text(&String::from_utf8_lossy(&c.into_inner())),
            Ok(Event::Eof) => return state.finish(document, position),
            Ok(_) => {}
            Err(e) => return Err(malformed(e.to_string())),
        }
        buf.clear();
    }
}

#[derive(Default)]
struct ParseState {
    open_suites: Vec<RawSuite>,
    finished: Vec<RawSuite>,
    orphans: Option<RawSuite>,
    case: Option<RawTestCase>,
    capture: Option<FailureCapture>,
}

struct FailureCapture {
    message: Option<String>,
    body: String,
}

impl ParseState {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), String> {
        match e.local_name().as_ref() {
            b"testsuite" => {
                let suite = RawSuite::new(attr(e, "name")?.unwrap_or_default());
                if empty {
                    self.finished.push(suite);
                } else {
                    self.open_suites.push(suite);
                }
            }
            b"testcase" => {
                self.case = Some(RawTestCase {
                    name: attr(e, "name")?.unwrap_or_default(),
                    classname: attr(e, "classname")?,
                    failure: None,
                    duration: parse_seconds(attr(e, "time")?.as_deref()),
                });
                if empty {
                    self.close_case();
                }
            }
            b"failure" | b"error" => {
                let has_cause = self.case.as_ref().is_some_and(|c| c.failure.is_some());
                if self.case.is_none() || has_cause {
                    return Ok(());
                }
                let capture = FailureCapture {
                    message: attr(e, "message")?,
                    body: String::new(),
                };
                if empty {
                    self.set_cause(capture.into_cause());
                } else {
                    self.capture = Some(capture);
                }
            }
            b"skipped" => self.set_cause(FailureCause::NotSupported),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"testsuite" => {
                if let Some(suite) = self.open_suites.pop() {
                    self.finished.push(suite);
                }
            }
            b"testcase" => self.close_case(),
            b"failure" | b"error" => {
                if let Some(capture) = self.capture.take() {
                    self.set_cause(capture.into_cause());
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.body.push_str(text);
        }
    }

    fn set_cause(&mut self, cause: FailureCause) {
        if let Some(case) = self.case.as_mut() {
            case.failure.get_or_insert(cause);
        }
    }

    fn close_case(&mut self) {
        let Some(case) = self.case.take() else {
            return;
        };
        match self.open_suites.last_mut() {
            Some(suite) => suite.tests.push(case),
            None => self.orphans.get_or_insert_with(RawSuite::default).tests.push(case),
        }
    }

    fn finish(mut self, document: &str, position: u64) -> Result<Vec<RawSuite>, JunitError> {
        let unclosed = match (self.open_suites.last(), &self.case) {
            (_, Some(case)) => Some(format!("testcase {:?}", case.name)),
            (Some(suite), None) => Some(format!("testsuite {:?}", suite.name)),
            (None, None) => None,
        };
        if let Some(element) = unclosed {
            return Err(JunitError::Malformed {
                document: document.to_string(),
                position,
                detail: format!("unexpected end of document inside {element}"),
            });
        }
        if let Some(orphans) = self.orphans.take() {
            self.finished.push(orphans);
        }
        if self.finished.is_empty() {
            return Err(JunitError::Empty {
                document: document.to_string(),
            });
        }
        Ok(self.finished)
    }
}

impl FailureCapture {
    fn into_cause(self) -> FailureCause {
        let body = self.body.trim();
        let text = match (self.message.as_deref().map(str::trim), body.is_empty()) {
            (Some(msg), false) if !msg.is_empty() => format!("{msg}\n{body}"),
            (Some(msg), _) if !msg.is_empty() => msg.to_string(),
            (_, false) => body.to_string(),
            _ => "test failed".to_string(),
        };
        FailureCause::Message(text)
    }
}

fn attr(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, String> {
    match e.try_get_attribute(key) {
        Ok(Some(a)) => a
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|err| err.to_string()),
        Ok(None) => Ok(None),
        Err(err) => Err(err.to_string()),
    }
}

fn parse_seconds(raw: Option<&str>) -> Duration {
    raw.map(|s| s.replace(',', ""))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="Web5TestVectorsDidJwk" tests="3">
    <testcase name="resolve" classname="Web5TestVectorsDidJwk" time="0.25"/>
    <testcase name="resolve_invalid" time="1.5">
      <failure message="expected error">assertion failed &amp; more</failure>
    </testcase>
    <testcase name="resolve_ed448">
      <skipped/>
    </testcase>
  </testsuite>
  <testsuite name="Unrelated">
    <testcase name="other"/>
  </testsuite>
</testsuites>"#;

    #[test]
    fn test_parses_suites_and_cases() {
        let suites = parse_junit("report.xml", REPORT.as_bytes()).unwrap();
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].name, "Web5TestVectorsDidJwk");
        assert_eq!(suites[0].tests.len(), 3);
        assert_eq!(suites[1].name, "Unrelated");

        let resolve = &suites[0].tests[0];
        assert_eq!(resolve.name, "resolve");
        assert_eq!(resolve.classname.as_deref(), Some("Web5TestVectorsDidJwk"));
        assert!(resolve.failure.is_none());
        assert_eq!(resolve.duration, Duration::from_millis(250));
    }

    #[test]
    fn test_failure_combines_message_and_body() {
        let suites = parse_junit("report.xml", REPORT.as_bytes()).unwrap();
        let failed = &suites[0].tests[1];
        assert_eq!(
            failed.failure,
            Some(FailureCause::Message(
                "expected error\nassertion failed & more".to_string()
            ))
        );
    }

    #[test]
    fn test_skipped_maps_to_not_supported() {
        let suites = parse_junit("report.xml", REPORT.as_bytes()).unwrap();
        assert_eq!(suites[0].tests[2].failure, Some(FailureCause::NotSupported));
    }

    #[test]
    fn test_bare_testsuite_root() {
        let xml = r#"<testsuite name="TbdexTestVectorsProtocol"><testcase name="parse_rfq"/></testsuite>"#;
        let suites = parse_junit("bare.xml", xml.as_bytes()).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].tests[0].name, "parse_rfq");
    }

    #[test]
    fn test_first_failure_wins() {
        let xml = r#"<testsuite name="s"><testcase name="t">
            <error message="first"/>
            <failure message="second"/>
        </testcase></testsuite>"#;
        let suites = parse_junit("x.xml", xml.as_bytes()).unwrap();
        assert_eq!(
            suites[0].tests[0].failure,
            Some(FailureCause::Message("first".to_string()))
        );
    }

    #[test]
    fn test_stray_testcases_land_in_unnamed_suite() {
        let xml = r#"<testcase name="web5::dids::vectors::did_jwk::resolve"/>"#;
        let suites = parse_junit("x.xml", xml.as_bytes()).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "");
        assert_eq!(suites[0].tests.len(), 1);
    }

    #[test]
    fn test_document_without_suites_is_an_error() {
        let err = parse_junit("empty.xml", b"<report/>").unwrap_err();
        assert!(matches!(err, JunitError::Empty { .. }));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let err = parse_junit("bad.xml", b"<testsuite name=\"a\"></testcase>").unwrap_err();
        assert!(matches!(err, JunitError::Malformed { .. }));
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        let xml = br#"<testsuites><testsuite name="Web5TestVectorsDidJwk"><testcase name="resolve"/>"#;
        let err = parse_junit("r.xml", xml).unwrap_err();
        assert!(matches!(err, JunitError::Malformed { ref detail, .. } if detail.contains("Web5TestVectorsDidJwk")));

        let cut_in_case = br#"<testsuite name="s"><testcase name="resolve"><failure message="x">"#;
        assert!(matches!(
            parse_junit("r.xml", cut_in_case).unwrap_err(),
            JunitError::Malformed { .. }
        ));
    }

    #[test]
    fn test_huge_time_does_not_overflow() {
        let xml = br#"<testsuite name="s"><testcase name="resolve" time="1e30"/></testsuite>"#;
        let suites = parse_junit("r.xml", xml).unwrap();
        assert_eq!(suites[0].tests[0].duration, Duration::ZERO);
    }

    #[test]
    fn test_time_parsing_is_lenient() {
        assert_eq!(parse_seconds(Some("1,000.5")), Duration::from_secs_f64(1000.5));
        assert_eq!(parse_seconds(Some("-1")), Duration::ZERO);
        assert_eq!(parse_seconds(Some("abc")), Duration::ZERO);
        assert_eq!(parse_seconds(Some("1e30")), Duration::ZERO);
        assert_eq!(parse_seconds(Some("NaN")), Duration::ZERO);
        assert_eq!(parse_seconds(None), Duration::ZERO);
    }
}
