use clap::Parser;
use image::ImageFormat;
use imgbatch::engine::{
    CancellationSignal, Cli, has_image_extension, is_image_file, output_format, path_relative_to,
    scaled_dimensions, setup_opts, watch_for_esc,
};
use imgbatch::utils::imgbatch_toml::{apply_file_to_opts, parse_imgbatch_toml};
use imgbatch::{
    Job, JobError, JobReport, JobState, Operation, RunOpts, TransformError, TransformOutcome,
};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

// --- path_relative_to ---

#[test]
fn test_path_relative_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/foo/bar/baz/qux.png");
    assert_eq!(
        path_relative_to(&path, &base),
        Some(PathBuf::from("baz/qux.png"))
    );
}

#[test]
fn test_path_relative_not_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/other/qux.png");
    assert_eq!(path_relative_to(&path, &base), None);
}

// --- extension allowlist ---

#[test]
fn test_has_image_extension_allowlist() {
    for name in ["a.jpg", "a.jpeg", "a.png", "a.bmp", "a.gif"] {
        assert!(has_image_extension(name), "{name}");
    }
}

#[test]
fn test_has_image_extension_case_insensitive() {
    assert!(has_image_extension("HOLIDAY.JPG"));
    assert!(has_image_extension("scan.Png"));
    assert!(has_image_extension("anim.GiF"));
}

#[test]
fn test_has_image_extension_rejects_others() {
    assert!(!has_image_extension("c.txt"));
    assert!(!has_image_extension("photo.webp"));
    assert!(!has_image_extension("photo.png.txt"));
    assert!(!has_image_extension("png"));
    assert!(!has_image_extension("tiff.tif"));
}

#[test]
fn test_is_image_file_uses_file_name_only() {
    assert!(is_image_file(Path::new("/data/x.jpeg")));
    assert!(!is_image_file(Path::new("/data.png/notes.md")));
    assert!(!is_image_file(Path::new("/")));
}

// --- scaled_dimensions ---

#[test]
fn test_scaled_dimensions_half() {
    assert_eq!(scaled_dimensions(100, 100, 0.5), (50, 50));
}

#[test]
fn test_scaled_dimensions_identity() {
    assert_eq!(scaled_dimensions(37, 21, 1.0), (37, 21));
}

#[test]
fn test_scaled_dimensions_rounds_to_nearest() {
    assert_eq!(scaled_dimensions(3, 5, 0.5), (2, 3));
    assert_eq!(scaled_dimensions(10, 10, 1.26), (13, 13));
    assert_eq!(scaled_dimensions(10, 10, 1.24), (12, 12));
}

#[test]
fn test_scaled_dimensions_can_collapse_to_zero() {
    assert_eq!(scaled_dimensions(1, 1, 0.1), (0, 0));
}

// --- output_format ---

#[test]
fn test_output_format_from_extension() {
    assert_eq!(
        output_format(Path::new("a.png"), ImageFormat::Jpeg),
        ImageFormat::Png
    );
    assert_eq!(
        output_format(Path::new("a.JPG"), ImageFormat::Png),
        ImageFormat::Jpeg
    );
    assert_eq!(
        output_format(Path::new("a.bmp"), ImageFormat::Jpeg),
        ImageFormat::Bmp
    );
}

#[test]
fn test_output_format_falls_back_to_default() {
    assert_eq!(
        output_format(Path::new("noext"), ImageFormat::Png),
        ImageFormat::Png
    );
    assert_eq!(
        output_format(Path::new("a.unknownfmt"), ImageFormat::Jpeg),
        ImageFormat::Jpeg
    );
}

// --- Job validation ---

#[test]
fn test_job_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = Job::new(&missing, false, Operation::Negate).unwrap_err();
    assert!(matches!(err, JobError::MissingSource(_)));
    assert!(err.is_config());
}

#[test]
fn test_job_source_is_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.png");
    std::fs::write(&file, b"x").unwrap();
    let err = Job::new(&file, false, Operation::Remove).unwrap_err();
    assert!(matches!(err, JobError::NotADirectory(_)));
}

#[test]
fn test_job_rejects_non_positive_scale() {
    let dir = tempfile::tempdir().unwrap();
    for factor in [0.0, -1.5, f64::NAN, f64::INFINITY] {
        let err = Job::new(dir.path(), false, Operation::Scale { factor }).unwrap_err();
        assert!(matches!(err, JobError::InvalidScale(_)), "{factor}");
    }
    assert!(Job::new(dir.path(), false, Operation::Scale { factor: 0.01 }).is_ok());
}

#[test]
fn test_job_creates_copy_target() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out").join("nested");
    let job = Job::new(
        dir.path(),
        true,
        Operation::Copy {
            target_dir: target.clone(),
        },
    )
    .unwrap();
    assert!(target.is_dir());
    assert!(job.recurse());
    assert_eq!(job.source_root(), dir.path());
}

#[test]
fn test_job_uncreatable_copy_target() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let err = Job::new(
        dir.path(),
        false,
        Operation::Copy {
            target_dir: blocker.join("sub"),
        },
    )
    .unwrap_err();
    assert!(matches!(err, JobError::TargetDir { .. }));
    assert!(err.is_config());
}

#[test]
fn test_discovery_error_is_not_config() {
    let err = JobError::Discovery {
        path: Some(PathBuf::from("/x")),
        message: "denied".to_string(),
    };
    assert!(!err.is_config());
    assert!(err.to_string().contains("/x"));
}

#[test]
fn test_worker_spawn_error_is_config() {
    let err = JobError::WorkerSpawn {
        index: 7,
        workers: 100_000,
        source: std::io::Error::other("resource temporarily unavailable"),
    };
    assert!(err.is_config());
    assert!(err.to_string().contains("7 of 100000"));
}

#[test]
fn test_operation_display() {
    assert_eq!(Operation::Scale { factor: 0.5 }.to_string(), "scale(0.5)");
    assert_eq!(Operation::Negate.to_string(), "negate");
    assert_eq!(Operation::Remove.to_string(), "remove");
    assert_eq!(
        Operation::Copy {
            target_dir: PathBuf::from("out")
        }
        .to_string(),
        "copy(out)"
    );
}

// --- CancellationSignal ---

#[test]
fn test_signal_starts_clear_and_set_is_idempotent() {
    let signal = CancellationSignal::new();
    assert!(!signal.is_set());
    signal.set();
    signal.set();
    assert!(signal.is_set());
}

#[test]
fn test_signal_clones_share_state_across_threads() {
    let signal = CancellationSignal::new();
    let writer = signal.clone();
    thread::spawn(move || writer.set()).join().unwrap();
    assert!(signal.is_set());
}

#[test]
fn test_watch_for_esc_sets_signal() {
    let signal = CancellationSignal::new();
    watch_for_esc(Cursor::new(b"abc\x1bdef".to_vec()), &signal);
    assert!(signal.is_set());
}

#[test]
fn test_watch_for_esc_ignores_other_input() {
    let signal = CancellationSignal::new();
    watch_for_esc(Cursor::new(b"quit\n".to_vec()), &signal);
    assert!(!signal.is_set());
}

// --- outcomes and report ---

fn report(outcomes: Vec<TransformOutcome>, not_run: usize) -> JobReport {
    JobReport {
        final_state: JobState::Completed,
        submitted: outcomes.len() + not_run,
        not_run,
        outcomes,
        clean_drain: true,
    }
}

#[test]
fn test_report_counts() {
    let r = report(
        vec![
            TransformOutcome::ok(PathBuf::from("a.png")),
            TransformOutcome::ok(PathBuf::from("b.png")),
            TransformOutcome::failed(PathBuf::from("c.png"), TransformError::NoFileName),
            TransformOutcome::failed(PathBuf::from("d.png"), TransformError::Cancelled),
        ],
        3,
    );
    assert_eq!(r.succeeded(), 2);
    assert_eq!(r.failed(), 1);
    assert_eq!(r.cancelled(), 1);
    assert_eq!(r.not_run, 3);
    assert!(!r.was_cancelled());
    assert_eq!(
        r.failures().map(|o| o.path.clone()).collect::<Vec<_>>(),
        vec![PathBuf::from("c.png")]
    );
}

#[test]
fn test_cancelled_outcome_renders_cancelled() {
    let o = TransformOutcome::failed(PathBuf::from("a.png"), TransformError::Cancelled);
    assert!(o.is_cancelled());
    assert!(!o.success);
    assert_eq!(o.error.unwrap().to_string(), "cancelled");
}

// --- RunOpts ---

#[test]
fn test_run_opts_defaults() {
    let opts = RunOpts::default();
    assert_eq!(opts.shutdown_timeout, Duration::from_secs(60));
    assert_eq!(opts.default_format, ImageFormat::Jpeg);
    assert!(opts.worker_count() >= 1);
    assert!(!opts.atomic_write);
}

#[test]
fn test_worker_count_never_zero() {
    let opts = RunOpts {
        workers: Some(0),
        ..RunOpts::default()
    };
    assert_eq!(opts.worker_count(), 1);
}

// --- settings file ---

#[test]
fn test_toml_applies_settings() {
    let file = parse_imgbatch_toml(
        r#"
[settings]
recurse = true
workers = 3
timeout = 5
default_format = "png"
atomic = true
"#,
    )
    .unwrap();
    let mut opts = RunOpts::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(file.recurse(), Some(true));
    assert_eq!(opts.workers, Some(3));
    assert_eq!(opts.shutdown_timeout, Duration::from_secs(5));
    assert_eq!(opts.default_format, ImageFormat::Png);
    assert!(opts.atomic_write);
    assert!(!opts.follow_links);
}

#[test]
fn test_toml_unknown_format_keeps_default() {
    let file = parse_imgbatch_toml("[settings]\ndefault_format = \"xyz\"\n").unwrap();
    let mut opts = RunOpts::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.default_format, ImageFormat::Jpeg);
}

#[test]
fn test_toml_empty_and_malformed() {
    assert!(parse_imgbatch_toml("").is_ok());
    assert!(parse_imgbatch_toml("[settings\nworkers = ").is_err());
}

// --- CLI ---

#[test]
fn test_cli_requires_an_operation() {
    assert!(Cli::try_parse_from(["imgbatch", "dir"]).is_err());
}

#[test]
fn test_cli_rejects_two_operations() {
    assert!(Cli::try_parse_from(["imgbatch", "dir", "--negate", "--remove"]).is_err());
    assert!(Cli::try_parse_from(["imgbatch", "dir", "--scale", "2", "--copy", "out"]).is_err());
}

#[test]
fn test_cli_operations() {
    let cli = Cli::try_parse_from(["imgbatch", "dir", "--scale", "0.5"]).unwrap();
    assert_eq!(cli.operation(), Operation::Scale { factor: 0.5 });

    let cli = Cli::try_parse_from(["imgbatch", "dir", "-n"]).unwrap();
    assert_eq!(cli.operation(), Operation::Negate);

    let cli = Cli::try_parse_from(["imgbatch", "dir", "--remove", "--sub"]).unwrap();
    assert_eq!(cli.operation(), Operation::Remove);
    assert_eq!(cli.sub, Some(true));

    let cli = Cli::try_parse_from(["imgbatch", "dir", "--copy", "out"]).unwrap();
    assert_eq!(
        cli.operation(),
        Operation::Copy {
            target_dir: PathBuf::from("out")
        }
    );
}

#[test]
fn test_cli_negative_scale_parses_for_validation() {
    let cli = Cli::try_parse_from(["imgbatch", "dir", "--scale", "-2"]).unwrap();
    assert_eq!(cli.operation(), Operation::Scale { factor: -2.0 });
}

#[test]
fn test_cli_rejects_bad_scale_and_format() {
    assert!(Cli::try_parse_from(["imgbatch", "dir", "--scale", "big"]).is_err());
    assert!(
        Cli::try_parse_from(["imgbatch", "dir", "-n", "--default-format", "nope"]).is_err()
    );
}

#[test]
fn test_setup_opts_cli_overrides_file() {
    let file = parse_imgbatch_toml("[settings]\nworkers = 3\nfollow_links = true\n").unwrap();
    let cli = Cli::try_parse_from([
        "imgbatch",
        "dir",
        "-n",
        "-j",
        "8",
        "--follow-links",
        "false",
        "--timeout",
        "2",
        "--default-format",
        "png",
    ])
    .unwrap();
    let opts = setup_opts(&cli, Some(&file));
    assert_eq!(opts.workers, Some(8));
    assert!(!opts.follow_links);
    assert_eq!(opts.shutdown_timeout, Duration::from_secs(2));
    assert_eq!(opts.default_format, ImageFormat::Png);
}

#[test]
fn test_setup_opts_file_applies_when_cli_silent() {
    let file = parse_imgbatch_toml("[settings]\nworkers = 3\nskip_unreadable = true\n").unwrap();
    let cli = Cli::try_parse_from(["imgbatch", "dir", "-r"]).unwrap();
    let opts = setup_opts(&cli, Some(&file));
    assert_eq!(opts.workers, Some(3));
    assert!(opts.skip_unreadable);
}
