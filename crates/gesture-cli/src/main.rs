use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gesture_core::{classifier, FaceBox, FrameSize, GestureLabel, LandmarkSet};
use gesture_hw::Camera;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod launcher;

#[derive(Parser)]
#[command(name = "gesture", about = "Hand gesture recognition CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the program banner and start the frame loop
    Launch {
        /// Branding image shown with the banner
        #[arg(long, default_value = launcher::DEFAULT_IMAGE)]
        image: PathBuf,
        /// Frame loop executable (default: gestured next to this binary)
        #[arg(long)]
        exe: Option<PathBuf>,
        /// Wait for the frame loop to exit
        #[arg(long)]
        wait: bool,
    },
    /// Classify a recorded landmark sample (JSON)
    Classify {
        /// Sample file
        file: PathBuf,
        /// Print a JSON result with every matching rule
        #[arg(long)]
        json: bool,
    },
    /// List gesture labels in priority order
    Labels,
    /// List video capture devices
    Devices,
}

/// One hand as recorded from a frame.
#[derive(Debug, Deserialize)]
struct Sample {
    landmarks: LandmarkSet,
    frame: FrameSize,
    #[serde(default)]
    face: Option<FaceBox>,
}

#[derive(Debug, Serialize)]
struct Verdict {
    label: GestureLabel,
    text: &'static str,
    matching: Vec<GestureLabel>,
}

fn classify_sample(json: &str) -> Result<Verdict> {
    let sample: Sample = serde_json::from_str(json).context("invalid landmark sample")?;
    let face = sample.face.as_ref();
    let label = classifier::classify(&sample.landmarks, sample.frame, face);
    Ok(Verdict {
        label,
        text: label.text(),
        matching: classifier::matching_rules(&sample.landmarks, sample.frame, face),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Launch { image, exe, wait } => {
            println!("{}", launcher::banner());
            launcher::load_branding(&image);

            let exe = exe.unwrap_or_else(launcher::default_exe);
            match launcher::spawn(&exe) {
                Ok(launched) if wait => {
                    let status = launched.wait()?;
                    println!("Frame loop exited: {status}");
                }
                Ok(launched) => {
                    println!("Frame loop started (pid {})", launched.id());
                }
                Err(err) => {
                    tracing::error!(exe = %exe.display(), error = %err, "failed to launch frame loop");
                }
            }
        }
        Commands::Classify { file, json } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let verdict = classify_sample(&text)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                println!("{}", verdict.text);
            }
        }
        Commands::Labels => {
            for label in GestureLabel::ALL {
                println!("{:>2}  {:<15} {}", label.priority(), format!("{label:?}"), label.text());
            }
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No video capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every point at (0.5, 0.5) except the listed (index, y) overrides.
    fn landmarks_json(overrides: &[(usize, f32)], as_objects: bool) -> String {
        let points: Vec<String> = (0..21)
            .map(|i| {
                let y = overrides
                    .iter()
                    .find(|(idx, _)| *idx == i)
                    .map_or(0.5, |&(_, y)| y);
                if as_objects {
                    format!(r#"{{"x":0.5,"y":{y},"z":0.0}}"#)
                } else {
                    format!("[0.5,{y},0.0]")
                }
            })
            .collect();
        format!("[{}]", points.join(","))
    }

    #[test]
    fn test_classify_sample_triples() {
        let lm = landmarks_json(&[(4, 0.7), (8, 0.7), (12, 0.7), (16, 0.7), (20, 0.7)], false);
        let json = format!(r#"{{"landmarks":{lm},"frame":{{"width":640,"height":480}}}}"#);
        let verdict = classify_sample(&json).unwrap();
        assert_eq!(verdict.label, GestureLabel::Danger);
        assert_eq!(verdict.text, "Gesture: Danger");
        // Danger and Yes overlap; Danger has priority.
        assert_eq!(verdict.matching, vec![GestureLabel::Danger, GestureLabel::Yes]);
    }

    #[test]
    fn test_classify_sample_objects_with_face() {
        // Index extended, others curled; index tip at pixel (320, 144).
        let lm = landmarks_json(&[(8, 0.3), (12, 0.7), (16, 0.7), (20, 0.7)], true);
        let json = format!(
            r#"{{"landmarks":{lm},"frame":{{"width":640,"height":480}},"face":[300,100,340,200]}}"#
        );
        let verdict = classify_sample(&json).unwrap();
        assert_eq!(verdict.label, GestureLabel::PointingAtFace);
        assert_eq!(verdict.text, "Gesture: I");
        assert!(verdict.matching.contains(&GestureLabel::Pointing));
    }

    #[test]
    fn test_classify_sample_unknown() {
        let lm = landmarks_json(&[], false);
        let json = format!(r#"{{"landmarks":{lm},"frame":{{"width":640,"height":480}}}}"#);
        let verdict = classify_sample(&json).unwrap();
        assert_eq!(verdict.label, GestureLabel::Unknown);
        assert_eq!(verdict.text, "Unknown Gesture");
        assert!(verdict.matching.is_empty());
    }

    #[test]
    fn test_classify_sample_rejects_wrong_count() {
        let json = r#"{"landmarks":[[0.5,0.5,0.0]],"frame":{"width":640,"height":480}}"#;
        assert!(classify_sample(json).is_err());
    }

    #[test]
    fn test_verdict_serializes() {
        let verdict = Verdict {
            label: GestureLabel::Okay,
            text: GestureLabel::Okay.text(),
            matching: vec![GestureLabel::Okay],
        };
        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(value["label"], "Okay");
        assert_eq!(value["text"], "Gesture: Okay");
    }

    #[test]
    fn test_cli_parses_launch() {
        let cli = Cli::try_parse_from(["gesture", "launch", "--exe", "/opt/gestured", "--wait"]).unwrap();
        match cli.command {
            Commands::Launch { image, exe, wait } => {
                assert_eq!(image, PathBuf::from(launcher::DEFAULT_IMAGE));
                assert_eq!(exe, Some(PathBuf::from("/opt/gestured")));
                assert!(wait);
            }
            _ => panic!("expected launch"),
        }
    }
}
