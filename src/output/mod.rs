use anyhow::Result;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::batch::{BatchResult, ProcessingOutcome, ProgressEvent, ProgressSink, RECENT_WINDOW};
use crate::cli::ReportFormat;
use crate::extractors::{Playlist, VideoDescriptor};
use crate::pipeline::PipelineReport;
use crate::utils::format_duration;

/// Terminal progress renderer: an indicatif bar with the last processed titles below it
pub struct ConsoleReporter {
    progress: ProgressBar,
    recent: Vec<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        let target = if quiet {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let multi = MultiProgress::with_draw_target(target);

        let progress = multi.add(ProgressBar::new_spinner());
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress.set_message("Fetching playlist information...");
        progress.enable_steady_tick(std::time::Duration::from_millis(120));

        let line_style = ProgressStyle::default_spinner()
            .template("  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let recent = (0..RECENT_WINDOW)
            .map(|_| {
                let line = multi.add(ProgressBar::new_spinner());
                line.set_style(line_style.clone());
                line
            })
            .collect();

        Self { progress, recent }
    }

    pub fn finish(&self) {
        for line in &self.recent {
            line.finish_and_clear();
        }
        self.progress.finish_and_clear();
    }

    /// Lines currently shown under the bar, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.recent
            .iter()
            .map(|line| line.message())
            .filter(|message| !message.is_empty())
            .collect()
    }
}

impl ProgressSink for ConsoleReporter {
    fn on_playlist_resolved(&mut self, playlist: &Playlist) {
        self.progress.set_length(playlist.videos.len() as u64);
        self.progress.set_position(0);
        self.progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.red/yellow}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.progress.println(format!(
            "Found {} videos in playlist: {}",
            playlist.videos.len(),
            style(&playlist.title).bold()
        ));
    }

    fn on_item_started(&mut self, video: &VideoDescriptor, _index: usize, _total: usize) {
        self.progress.set_message(format!("Processing: {}", video.title));
    }

    fn on_progress(&mut self, event: &ProgressEvent<'_>) {
        self.progress.set_position(event.completed as u64);
        self.progress.set_message(format!(
            "Processed: {}/{}  Success: {}",
            event.completed, event.total, event.success_count
        ));

        let recent = event.recent();
        for (index, line) in self.recent.iter().enumerate() {
            match recent.get(index) {
                Some(outcome) => line.set_message(outcome_line(outcome)),
                None => line.set_message(""),
            }
        }
    }
}

fn outcome_line(outcome: &ProcessingOutcome) -> String {
    match outcome {
        ProcessingOutcome::Success { video, .. } => {
            format!("{} {}", style("✓").green(), video.title)
        }
        ProcessingOutcome::Failure { video, .. } => {
            format!("{} {}", style("✗").red(), video.title)
        }
    }
}

/// Machine-readable form of the final report
#[derive(Serialize)]
struct JsonReport<'a> {
    url: &'a str,
    playlist_title: &'a str,
    archive: Option<&'a Path>,
    cancelled: bool,
    elapsed_secs: f64,
    #[serde(flatten)]
    result: &'a BatchResult,
}

/// Human-readable summary of a finished run
pub fn format_as_text(report: &PipelineReport) -> Result<String> {
    let result = &report.run.result;
    let mut out = String::new();

    if result.is_empty() {
        writeln!(out, "Nothing to do: the playlist has no videos.")?;
        return Ok(out);
    }

    if result.has_successes() {
        writeln!(
            out,
            "✅ Completed! Successfully downloaded {} of {} transcripts",
            result.success_count, result.total
        )?;
        if let Some(path) = &report.archive_path {
            writeln!(
                out,
                "📥 {} Transcripts saved to: {}",
                report.playlist_title,
                path.display()
            )?;
        }
    } else {
        writeln!(out, "❌ Could not download any transcripts from this playlist.")?;
    }

    if report.run.cancelled {
        writeln!(out, "Run was cancelled; remaining videos were skipped.")?;
    }

    if !result.failures.is_empty() {
        writeln!(out, "⚠️ Failed downloads:")?;
        for failure in &result.failures {
            writeln!(out, "- {}: {}", failure.title, failure.error)?;
        }
    }

    writeln!(
        out,
        "Finished in {}",
        format_duration(report.elapsed.as_secs_f64())
    )?;
    Ok(out)
}

pub fn format_as_json(report: &PipelineReport) -> Result<String> {
    let json = JsonReport {
        url: &report.url,
        playlist_title: &report.playlist_title,
        archive: report.archive_path.as_deref(),
        cancelled: report.run.cancelled,
        elapsed_secs: report.elapsed.as_secs_f64(),
        result: &report.run.result,
    };

    Ok(serde_json::to_string_pretty(&json)?)
}

/// Print the final report to stdout
pub fn print_report(report: &PipelineReport, format: ReportFormat) -> Result<()> {
    let content = match format {
        ReportFormat::Text => format_as_text(report)?,
        ReportFormat::Json => format_as_json(report)?,
    };

    print!("{}", content);
    if format == ReportFormat::Json {
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchRun, FailedVideo};
    use std::path::PathBuf;
    use std::time::Duration;

    fn report(success_count: usize, failures: &[(&str, &str)], archive: bool) -> PipelineReport {
        let failures: Vec<FailedVideo> = failures
            .iter()
            .map(|(title, error)| FailedVideo {
                title: title.to_string(),
                error: error.to_string(),
            })
            .collect();

        PipelineReport {
            url: "https://www.youtube.com/playlist?list=PLx".to_string(),
            playlist_title: "Rust Talks".to_string(),
            run: BatchRun {
                outcomes: Vec::new(),
                result: BatchResult {
                    total: success_count + failures.len(),
                    success_count,
                    failures,
                },
                cancelled: false,
            },
            archive_path: archive.then(|| PathBuf::from("/tmp/Rust Talks_transcripts.zip")),
            elapsed: Duration::from_secs(75),
        }
    }

    #[test]
    fn test_text_report_lists_failures() {
        let text = format_as_text(&report(2, &[("Broken", "Subtitles are disabled for this video")], true)).unwrap();

        assert!(text.contains("Successfully downloaded 2 of 3 transcripts"));
        assert!(text.contains("/tmp/Rust Talks_transcripts.zip"));
        assert!(text.contains("⚠️ Failed downloads:"));
        assert!(text.contains("- Broken: Subtitles are disabled for this video"));
        assert!(text.contains("Finished in 1m 15s"));
    }

    #[test]
    fn test_text_report_total_failure() {
        let text = format_as_text(&report(0, &[("A", "x"), ("B", "y")], false)).unwrap();

        assert!(text.contains("❌ Could not download any transcripts from this playlist."));
        assert!(!text.contains("saved to"));
        assert!(text.contains("- A: x"));
        assert!(text.contains("- B: y"));
    }

    #[test]
    fn test_text_report_empty_playlist() {
        let text = format_as_text(&report(0, &[], false)).unwrap();
        assert_eq!(text, "Nothing to do: the playlist has no videos.\n");
    }

    #[test]
    fn test_json_report() {
        let json = format_as_json(&report(1, &[("B", "disabled")], true)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["playlist_title"], "Rust Talks");
        assert_eq!(value["total"], 2);
        assert_eq!(value["success_count"], 1);
        assert_eq!(value["failures"][0]["title"], "B");
        assert_eq!(value["failures"][0]["error"], "disabled");
        assert_eq!(value["archive"], "/tmp/Rust Talks_transcripts.zip");
        assert_eq!(value["cancelled"], false);
    }

    #[test]
    fn test_reporter_accepts_events_when_quiet() {
        let mut reporter = ConsoleReporter::new(true);
        let video = VideoDescriptor {
            id: "a".to_string(),
            title: "A".to_string(),
        };
        reporter.on_playlist_resolved(&Playlist {
            title: "P".to_string(),
            videos: vec![video.clone()],
        });
        reporter.on_item_started(&video, 0, 1);

        let outcomes = vec![ProcessingOutcome::Failure {
            video,
            error: "disabled".to_string(),
        }];
        reporter.on_progress(&ProgressEvent {
            completed: 1,
            total: 1,
            success_count: 0,
            outcomes: &outcomes,
        });
        reporter.finish();
    }

    #[test]
    fn test_reporter_shows_only_recent_titles() {
        let mut reporter = ConsoleReporter::new(true);
        let videos: Vec<VideoDescriptor> = (0..7)
            .map(|i| VideoDescriptor {
                id: i.to_string(),
                title: format!("Video {i}"),
            })
            .collect();
        reporter.on_playlist_resolved(&Playlist {
            title: "P".to_string(),
            videos: videos.clone(),
        });

        let mut outcomes = Vec::new();
        for (index, video) in videos.iter().enumerate() {
            outcomes.push(if index == 5 {
                ProcessingOutcome::Failure {
                    video: video.clone(),
                    error: "disabled".to_string(),
                }
            } else {
                ProcessingOutcome::Success {
                    video: video.clone(),
                    filename: format!("{}.txt", video.id),
                    transcript: "text".to_string(),
                }
            });
            reporter.on_progress(&ProgressEvent {
                completed: index + 1,
                total: videos.len(),
                success_count: outcomes.iter().filter(|o| o.is_success()).count(),
                outcomes: &outcomes,
            });

            if index == 1 {
                assert_eq!(reporter.recent_lines().len(), 2);
            }
        }

        let lines = reporter.recent_lines();
        assert_eq!(lines.len(), RECENT_WINDOW);
        for (line, expected) in lines.iter().zip(["Video 2", "Video 3", "Video 4", "Video 5", "Video 6"]) {
            assert!(line.ends_with(expected), "{line:?} should show {expected}");
        }
        assert!(lines[3].contains('✗'));
        assert!(lines[4].contains('✓'));
        assert!(!lines.iter().any(|line| line.contains("Video 0") || line.contains("Video 1")));
        reporter.finish();
    }
}
