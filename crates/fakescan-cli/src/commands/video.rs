//! Video command - frame sampling and REAL/FAKE voting.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use fakescan_media::{build_service, FailurePolicy, VideoAnalysisOptions, VideoReport, DEFAULT_FRAME_STRIDE};
use fakescan_models::{format_percent, Verdict, VideoPredictionResponse};
use serde::Serialize;

use super::{ExitCode, ModelArgs};
use crate::output::{print_json, ProgressBar};

#[derive(Args, Clone, Debug)]
pub struct VideoArgs {
    /// Video to screen
    pub path: PathBuf,

    /// Analyze every Nth frame
    #[arg(long, default_value_t = DEFAULT_FRAME_STRIDE, value_parser = parse_stride)]
    pub stride: usize,

    /// Write an annotated copy of the video here
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Per-frame failure handling: fail_fast or isolate
    #[arg(long, default_value = "fail_fast")]
    pub failure_policy: FailurePolicy,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub models: ModelArgs,
}

#[derive(Serialize)]
struct VideoResult<'a> {
    #[serde(flatten)]
    prediction: VideoPredictionResponse,
    frames_read: u64,
    frames_with_face: u64,
    frames_failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a PathBuf>,
}

fn parse_stride(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("stride must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{s}' is not a valid frame stride")),
    }
}

pub fn run(args: &VideoArgs) -> Result<ExitCode> {
    let paths = args.models.checked_paths()?;
    if !args.path.is_file() {
        bail!("Video not found at {}", args.path.display());
    }

    let options = VideoAnalysisOptions::default()
        .with_stride(args.stride)
        .with_failure_policy(args.failure_policy);
    let service = build_service(&paths, options).context("Cannot load the models")?;

    if !args.json {
        println!("--- Processing video: {} ---", args.path.display());
    }
    let progress = ProgressBar::new(None, args.quiet || args.json);
    let callback = progress.video_callback();

    let report = match service.predict_video(&args.path, args.output.as_deref(), Some(&callback)) {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            return Err(e).with_context(|| format!("Screening {} failed", args.path.display()));
        }
    };
    progress.finish("analysis complete");

    if args.json {
        print_json(&VideoResult {
            prediction: VideoPredictionResponse::new(&report.verdict, report.frames_sampled),
            frames_read: report.frames_read,
            frames_with_face: report.frames_with_face,
            frames_failed: report.frames_failed,
            output: args.output.as_ref(),
        })?;
    } else {
        print_summary(&report, args.output.as_ref());
    }
    Ok(ExitCode::Success)
}

fn print_summary(report: &VideoReport, output: Option<&PathBuf>) {
    let verdict = &report.verdict;
    println!();
    println!("--- Video analysis complete ---");
    if let Some(output) = output {
        println!("Annotated video saved to: {}", output.display());
    }
    println!(
        "Frames: {} read, {} sampled, {} with a face, {} failed",
        report.frames_read, report.frames_sampled, report.frames_with_face, report.frames_failed
    );
    println!(
        "Overall: {} of the analyzed faces are REAL, {} are FAKE ({} / {} votes)",
        format_percent(1.0 - verdict.fake_fraction),
        format_percent(verdict.fake_fraction),
        verdict.real_votes,
        verdict.fake_votes
    );
    let description = match verdict.verdict {
        Verdict::Fake => "the video is probably a DEEPFAKE",
        Verdict::Real => "the video is probably REAL",
    };
    println!(
        "Final verdict: {} {} - {}",
        verdict.verdict,
        format_percent(verdict.confidence),
        description
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stride() {
        assert_eq!(parse_stride("5"), Ok(5));
        assert!(parse_stride("0").is_err());
        assert!(parse_stride("-1").is_err());
    }
}
