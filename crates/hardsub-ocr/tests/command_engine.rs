#![cfg(all(unix, feature = "engine-command"))]

use hardsub_ocr::{CommandOcrEngine, LumaPlane, OcrEngine, OcrError, OcrRegion, OcrRequest};
use hardsub_types::LumaFrame;

fn strip() -> LumaFrame {
    LumaFrame::from_owned(16, 4, 16, vec![200; 64]).unwrap()
}

fn shell(script: &str) -> CommandOcrEngine {
    CommandOcrEngine::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "{image}".to_string()],
    )
    .unwrap()
}

#[test]
fn each_stdout_line_becomes_a_fragment() {
    let engine = shell(r#"test -s "$0" && printf '第一行\n\n 第二行 \n'"#);
    let frame = strip();
    let regions = [OcrRegion::full(frame.width(), frame.height())];
    let request = OcrRequest::new(LumaPlane::from_frame(&frame), &regions);

    let response = engine.recognize(&request).unwrap();
    let texts: Vec<&str> = response.texts.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["第一行", "第二行"]);
    assert_eq!(response.joined_text(), "第一行 第二行");
}

#[test]
fn failing_program_reports_the_frame() {
    let engine = shell("echo boom >&2; exit 3");
    let frame = strip().with_frame_index(Some(3));
    let regions = [OcrRegion::full(frame.width(), frame.height())];
    let request = OcrRequest::for_frame(&frame, &regions);

    match engine.recognize(&request) {
        Err(OcrError::ProgramFailed {
            program,
            frame,
            detail,
        }) => {
            assert_eq!(program, "sh");
            assert_eq!(frame, Some(3));
            assert!(detail.contains("boom"));
        }
        other => panic!("expected program failure, got {other:?}"),
    }
}

#[test]
fn empty_region_produces_no_fragments() {
    let engine = shell("echo should-not-run");
    let frame = strip();
    let regions = [OcrRegion::new(0.0, 0.0, 0.0, 0.0)];
    let request = OcrRequest::new(LumaPlane::from_frame(&frame), &regions);
    assert!(engine.recognize(&request).unwrap().is_empty());
}
