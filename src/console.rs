//! Line-command driver for a headless pose widget.
//!
//! Each stdin line is parsed as one command with clap and applied to a single
//! widget. Upload outcomes are drained between commands; a failed upload is
//! printed as an alert on stderr.

use clap::{Parser, Subcommand, ValueEnum};
use pose_canvas::consts::MIN_SCALE;
use pose_canvas::geom::Point;
use pose_canvas::input::Modifiers;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use crate::services::persistence::{PersistError, PersistOutcome};
use crate::state::AppState;
use crate::widget::PoseWidget;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "pose", disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a default-pose skeleton.
    Add,
    /// Clear to a single default-pose skeleton.
    Reset,
    Undo,
    Redo,
    /// Print the scene as preset JSON.
    Show,
    /// List the image names known to this node.
    Images,
    /// Move a skeleton by an offset.
    Move {
        skeleton: usize,
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },
    /// Rotate a skeleton to an absolute angle in degrees.
    Rotate {
        skeleton: usize,
        #[arg(allow_negative_numbers = true)]
        degrees: f64,
    },
    /// Set a skeleton's scale factors.
    Scale { skeleton: usize, sx: f64, sy: f64 },
    /// Toggle a skeleton's mirror flag on one axis.
    Flip {
        skeleton: usize,
        #[arg(value_enum)]
        axis: Axis,
    },
    /// Move one keypoint to a canvas position.
    Kp {
        skeleton: usize,
        keypoint: usize,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Replay a pointer drag between two display positions.
    Drag {
        #[arg(allow_negative_numbers = true)]
        x1: f64,
        #[arg(allow_negative_numbers = true)]
        y1: f64,
        #[arg(allow_negative_numbers = true)]
        x2: f64,
        #[arg(allow_negative_numbers = true)]
        y2: f64,
        /// Hold shift: snap rotation, keep aspect, move the whole group.
        #[arg(long)]
        shift: bool,
    },
    /// Show or hide the eye keypoints.
    Eyes {
        #[arg(value_enum)]
        setting: Toggle,
    },
    /// Load a preset from JSON text.
    Load {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        json: Vec<String>,
    },
    /// Select an image and load its stored preset.
    Select { name: String },
    /// Delete this node's presets and exit.
    Remove,
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

/// Parse one input line. A blank line is `Ok(None)`.
///
/// # Errors
///
/// Returns the clap error for unknown commands or bad arguments, including
/// the `help` display.
pub fn parse_command(line: &str) -> Result<Option<Command>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    Line::try_parse_from(words).map(|line| Some(line.command))
}

/// Apply `command` to `widget` and return the text to print, if any.
/// `Remove` and `Quit` are handled by [`run`].
pub async fn execute(widget: &mut PoseWidget, command: Command) -> Option<String> {
    match command {
        Command::Add => widget.add_pose(),
        Command::Reset => widget.reset(),
        Command::Undo => widget.undo(),
        Command::Redo => widget.redo(),
        Command::Show => {
            return Some(widget.serialize_json().unwrap_or_else(|e| format!("error: {e}")));
        }
        Command::Images => {
            let combo = widget.image();
            return Some(format!("{} [{}]", combo.value, combo.values.join(", ")));
        }
        Command::Move { skeleton, dx, dy } => {
            return edited(widget.edit_transform(skeleton, |t| {
                t.left += dx;
                t.top += dy;
            }));
        }
        Command::Rotate { skeleton, degrees } => {
            return edited(widget.edit_transform(skeleton, |t| {
                let center = t.center();
                t.angle = degrees;
                t.set_center(center);
            }));
        }
        Command::Scale { skeleton, sx, sy } => {
            return edited(widget.edit_transform(skeleton, |t| {
                let center = t.center();
                t.scale_x = sx.max(MIN_SCALE);
                t.scale_y = sy.max(MIN_SCALE);
                t.set_center(center);
            }));
        }
        Command::Flip { skeleton, axis } => {
            return edited(widget.edit_transform(skeleton, |t| match axis {
                Axis::X => t.flip_x = !t.flip_x,
                Axis::Y => t.flip_y = !t.flip_y,
            }));
        }
        Command::Kp { skeleton, keypoint, x, y } => {
            return edited(widget.move_keypoint(skeleton, keypoint, Point::new(x, y)));
        }
        Command::Drag { x1, y1, x2, y2, shift } => {
            let modifiers = Modifiers { shift, ..Modifiers::default() };
            widget.drag(Point::new(x1, y1), Point::new(x2, y2), modifiers);
        }
        Command::Eyes { setting } => widget.set_visible_eyes(setting == Toggle::On),
        Command::Load { json } => {
            if let Err(e) = widget.load_preset_json(&json.join(" ")) {
                return Some(format!("error: {e}"));
            }
        }
        Command::Select { name } => {
            if !widget.select_image(&name).await {
                return Some(format!("no stored pose for {name}"));
            }
        }
        Command::Remove | Command::Quit => {}
    }
    None
}

fn edited(changed: bool) -> Option<String> {
    if changed { None } else { Some("no such skeleton or keypoint".to_string()) }
}

/// Drive one widget from stdin until `quit`, `remove`, or end of input.
///
/// # Errors
///
/// Returns [`ConsoleError`] when stdin fails or the store cannot be saved on
/// removal.
pub async fn run(state: AppState, mut outcomes: mpsc::UnboundedReceiver<PersistOutcome>) -> Result<(), ConsoleError> {
    let mut widget = PoseWidget::create(state).await;
    println!("{} ready, type `help` for commands", widget.node());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Remove)) => {
                        widget.on_removed().await?;
                        return Ok(());
                    }
                    Ok(Some(command)) => {
                        if let Some(reply) = execute(&mut widget, command).await {
                            println!("{reply}");
                        }
                    }
                    Err(e) => print!("{}", e.render()),
                }
            }
            Some(outcome) = outcomes.recv() => {
                if let Some(alert) = widget.on_persisted(outcome) {
                    eprintln!("alert: {alert}");
                }
            }
        }
    }

    info!(node = widget.node(), "console closed");
    Ok(())
}

#[cfg(test)]
#[path = "console_test.rs"]
mod tests;
