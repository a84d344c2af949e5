use std::fs;
use std::path::Path;
use std::process::Command;

use hardsub_types::SampledFrame;
use hardsub_video::{FfmpegExtractor, FrameExtractor, VideoError, collect_frames, find_ffmpeg, load_cropped_frame};
use image::{GrayImage, Luma};

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

#[tokio::test]
async fn frames_are_sorted_numerically() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["frame_000010.jpg", "frame_000002.jpg", "frame_000001.jpg"] {
        touch(dir.path(), name);
    }
    for index in 3..10 {
        touch(dir.path(), &format!("frame_{index:06}.jpg"));
    }
    touch(dir.path(), "video.mp4");
    touch(dir.path(), "notes.txt");

    let frames = collect_frames(dir.path()).await.unwrap();
    let indices: Vec<u64> = frames.iter().map(SampledFrame::index).collect();
    assert_eq!(indices, (1..=10).collect::<Vec<_>>());
    assert!(frames[9].path().ends_with("frame_000010.jpg"));
}

#[tokio::test]
async fn gap_in_numbering_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "frame_000001.jpg");
    touch(dir.path(), "frame_000003.jpg");

    let err = collect_frames(dir.path()).await.unwrap_err();
    assert!(matches!(err, VideoError::FrameSequence { .. }), "{err}");
}

#[tokio::test]
async fn empty_directory_has_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "video.mp4");

    let err = collect_frames(dir.path()).await.unwrap_err();
    assert!(matches!(err, VideoError::NoFrames { .. }));
}

#[test]
fn cropped_frame_carries_index_and_band_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_000004.jpg");
    GrayImage::from_pixel(64, 48, Luma([200u8])).save(&path).unwrap();

    let frame = SampledFrame::new(4, path);
    let luma = load_cropped_frame(&frame, 0.25).unwrap();
    assert_eq!(luma.frame_index(), Some(4));
    assert_eq!((luma.width(), luma.height()), (64, 12));
}

#[test]
fn unreadable_frame_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_000001.jpg");
    fs::write(&path, b"garbage").unwrap();

    let err = load_cropped_frame(&SampledFrame::new(1, path.clone()), 0.2).unwrap_err();
    match err {
        VideoError::Image { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn five_second_clip_yields_five_frames() {
    let ffmpeg = find_ffmpeg(None).expect("ffmpeg is required for this test");

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("synthetic.mp4");
    let status = Command::new(&ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"])
        .arg("testsrc=duration=5:size=320x240:rate=25")
        .args(["-pix_fmt", "yuv420p"])
        .arg(&video)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg could not render the test clip");

    let frames = FfmpegExtractor::new(ffmpeg)
        .extract(&video, 1.0, &dir.path().join("frames"))
        .await
        .unwrap();
    assert_eq!(frames.len(), 5);
    assert_eq!(frames.first().map(SampledFrame::index), Some(1));
    assert_eq!(frames.last().map(SampledFrame::index), Some(5));

    let luma = load_cropped_frame(&frames[0], 0.2).unwrap();
    assert_eq!((luma.width(), luma.height()), (320, 48));
}
