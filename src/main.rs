use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use opencv::{
    core::{Mat, Point2i, Scalar},
    highgui,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_AA},
};
use pose_angle::{
    camera::{self, CameraConfig, OpenCvSource},
    detector::DnnDetector,
    pipeline::{DisplaySlot, PipelineStats},
    DisplayResult, FrameProcessor, JointTriple, Orientation, OrientationControl, Pipeline,
    PipelineConfig, ProcessorConfig,
};
use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};
use structopt::StructOpt;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;

const WINDOW_NAME: &str = "pose-angle";
const Q_KEY: u8 = b'q';
const R_KEY: u8 = b'r';
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

#[derive(structopt::StructOpt)]
struct Opt {
    /// Path to an ONNX single pose keypoint model.
    #[structopt(required = true)]
    model: PathBuf,

    /// A v4l2 compatible device: /dev/videoDEVICE
    #[structopt(short, long, default_value = "0")]
    device: i32,

    /// The width of the image the model expects.
    #[structopt(short, long, default_value = "192")]
    width: u16,

    /// The height of the image the model expects.
    #[structopt(short = "-H", long, default_value = "192")]
    height: u16,

    /// The width of the input frame.
    #[structopt(long)]
    frame_width: Option<u16>,

    /// The height of the input frame.
    #[structopt(long)]
    frame_height: Option<u16>,

    /// Maximum number of frames per second handed to the detector. 0 disables the cap.
    #[structopt(short = "-f", long, default_value = "15")]
    max_fps: f32,

    /// Joints to measure, as first,vertex,last.
    #[structopt(short, long, default_value = "right-shoulder,right-elbow,right-wrist")]
    joints: JointTriple,

    /// Exponential smoothing factor in (0, 1). Larger follows movement faster.
    #[structopt(short, long, default_value = "0.2")]
    smoothing: f32,

    /// Keypoints must score above this to be used.
    #[structopt(short, long, default_value = "0.0")]
    threshold: f32,

    /// Poses whose mean keypoint score is at or below this count as no pose.
    #[structopt(long, default_value = "0.1")]
    min_pose_score: f32,

    /// Initial device orientation. Press 'r' in the window to rotate.
    #[structopt(short, long, default_value = "portrait")]
    orientation: Orientation,

    /// Mirror frames horizontally, for front facing cameras.
    #[structopt(short, long)]
    mirror: bool,

    #[structopt(short = "-W", long, default_value = "1")]
    wait_key_ms: i32,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short = "-p", long)]
    show_progress: bool,
}

/// Draw the frame with the latest angle text on top.
fn show(result: &DisplayResult, angle_text: &str) -> Result<()> {
    let rgb = camera::image_to_mat(&result.frame.image)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)
        .context("failed converting frame to BGR")?;
    imgproc::put_text(
        &mut bgr,
        &format!("angle: {}", angle_text),
        Point2i::new(10, 30),
        FONT_HERSHEY_SIMPLEX,
        1.0,
        Scalar::from(WHITE),
        2,       // thickness
        LINE_AA, // line_type
        false,   // bottom_left_origin
    )
    .context("failed drawing angle text")?;
    highgui::imshow(WINDOW_NAME, &bgr).context("failed showing frame")?;
    Ok(())
}

fn display_loop(
    display: &DisplaySlot<DisplayResult>,
    running: &AtomicBool,
    orientation: &OrientationControl,
    stats: &PipelineStats,
    progress: Option<&ProgressBar>,
    wait_key_ms: i32,
) -> Result<()> {
    let started = Instant::now();
    let mut angle_text = String::from("--");

    while running.load(Ordering::SeqCst) {
        if let Some(result) = display.wait_timeout(Duration::from_millis(100)) {
            if let Some(text) = result.angle_text() {
                angle_text = text;
            }
            show(&result, &angle_text)?;

            if let Some(progress) = progress {
                let snapshot = stats.snapshot();
                progress.set_message(format!(
                    "angle: {} | fps: {:.1} | dropped: {} busy, {} rate",
                    angle_text,
                    snapshot.processed as f64 / started.elapsed().as_secs_f64(),
                    snapshot.dropped_busy,
                    snapshot.dropped_rate,
                ));
                progress.inc(1);
            }
        }

        let key = highgui::wait_key(wait_key_ms).context("failed waiting for key")?;
        if key == i32::from(Q_KEY) {
            running.store(false, Ordering::SeqCst);
        } else if key == i32::from(R_KEY) {
            let next = orientation.get().next();
            info!(orientation = %next, "changing orientation");
            orientation.set(next);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    let detector = DnnDetector::new(&opt.model, (opt.width, opt.height), opt.min_pose_score)
        .context("failed constructing detector")?;
    let processor = FrameProcessor::new(
        detector,
        ProcessorConfig {
            joints: opt.joints,
            smoothing_factor: opt.smoothing,
            min_score: opt.threshold,
            ..Default::default()
        },
    )
    .context("failed constructing frame processor")?;
    let max_fps = if opt.max_fps > 0.0 {
        Some(opt.max_fps)
    } else {
        None
    };
    let mut pipeline = Pipeline::new(
        processor,
        PipelineConfig {
            max_fps,
            orientation: opt.orientation,
            mirror: opt.mirror,
        },
    )
    .context("failed constructing pipeline")?;

    let source = OpenCvSource::open(&CameraConfig {
        device: opt.device,
        frame_width: opt.frame_width,
        frame_height: opt.frame_height,
        fps: max_fps,
    })
    .context("failed opening camera")?;

    let running = pipeline.running();
    let running_ctrl_c = running.clone();
    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    let display = pipeline.display();
    let orientation = pipeline.orientation();
    let stats = pipeline.stats();

    let progress = if opt.show_progress {
        Some(
            ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                    .template("{prefix:.bold.dim} {spinner} {wide_msg}"),
            ),
        )
    } else {
        None
    };

    let wait_key_ms = opt.wait_key_ms;
    let captured = crossbeam::thread::scope(|scope| {
        let worker = scope.spawn(|_| {
            let captured = pipeline.run(source);
            // closes the window once the camera is done
            running.store(false, Ordering::SeqCst);
            captured
        });

        let shown = display_loop(
            &display,
            &running,
            &orientation,
            &stats,
            progress.as_ref(),
            wait_key_ms,
        );
        // stop capture if the display gave up first
        running.store(false, Ordering::SeqCst);

        let captured = worker
            .join()
            .map_err(|_| anyhow!("pipeline thread panicked"))?;
        shown.map(|()| captured)
    })
    .map_err(|_| anyhow!("pipeline thread panicked"))??;

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    match captured {
        Ok(snapshot) => {
            info!(
                message = "done",
                processed = snapshot.processed,
                measured = snapshot.measured,
                dropped_busy = snapshot.dropped_busy
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "camera capture failed");
            Err(e).context("camera capture failed")
        }
    }
}
